//! Session configuration.

use crate::error::{SessionError, SessionResult};
use std::time::Duration;

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Default session TTL
    pub default_ttl: Duration,
    /// Maximum session TTL (for security)
    pub max_ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(3600),  // 1 hour
            max_ttl: Duration::from_secs(86400 * 7), // 7 days
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default session TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Set the maximum session TTL.
    pub fn with_max_ttl(mut self, ttl: Duration) -> Self {
        self.max_ttl = ttl;
        self
    }

    /// Clamp a requested TTL to the maximum, falling back to the default.
    ///
    /// ```
    /// use signet_session::SessionConfig;
    /// use std::time::Duration;
    ///
    /// let config = SessionConfig::default().with_max_ttl(Duration::from_secs(60));
    /// assert_eq!(config.effective_ttl(Some(Duration::from_secs(600))), Duration::from_secs(60));
    /// ```
    pub fn effective_ttl(&self, ttl: Option<Duration>) -> Duration {
        ttl.unwrap_or(self.default_ttl).min(self.max_ttl)
    }

    pub fn validate(&self) -> SessionResult<()> {
        if self.default_ttl.is_zero() {
            return Err(SessionError::Config(
                "default TTL must be greater than zero".to_string(),
            ));
        }

        if self.default_ttl > self.max_ttl {
            return Err(SessionError::Config(
                "default TTL must not exceed the maximum TTL".to_string(),
            ));
        }

        Ok(())
    }
}
