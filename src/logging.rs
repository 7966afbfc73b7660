//! Tracing subscriber bootstrap.
//!
//! The library crates only emit `tracing` events; applications call
//! [`LogConfig::init`] (or [`init_from_env`]) once at startup to print them.
//!
//! # Environment Variables
//!
//! - `SIGNET_LOG` - filter directives, e.g. `signet_csrf=debug,info` (default `info`)
//! - `SIGNET_LOG_FORMAT` - `json` (default), `pretty` or `compact`
//!
//! ```no_run
//! use signet::logging::{LogConfig, LogFormat};
//!
//! LogConfig::default()
//!     .format(LogFormat::Pretty)
//!     .with_env_filter("signet_csrf=debug,info")
//!     .init()
//!     .expect("logging already initialized");
//! ```

use std::env;
use std::str::FromStr;
use tracing_subscriber::{
    EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError,
};

pub const LOG_FILTER_ENV_VAR: &str = "SIGNET_LOG";
pub const LOG_FORMAT_ENV_VAR: &str = "SIGNET_LOG_FORMAT";

const DEFAULT_FILTER: &str = "info";

/// Output format for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON format (default) - structured, machine-readable
    #[default]
    Json,
    /// Pretty format - multi-line, for development
    Pretty,
    /// Compact format - minimal output
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    /// `EnvFilter` directives
    pub filter: String,
    /// Include the event target (module path)
    pub targets: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            filter: DEFAULT_FILTER.to_string(),
            targets: true,
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `SIGNET_LOG` and `SIGNET_LOG_FORMAT`; unset or invalid values keep
    /// the defaults.
    pub fn from_env() -> Self {
        Self::from_values(
            env::var(LOG_FILTER_ENV_VAR).ok(),
            env::var(LOG_FORMAT_ENV_VAR).ok(),
        )
    }

    fn from_values(filter: Option<String>, format: Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(filter) = filter.filter(|f| !f.trim().is_empty()) {
            config.filter = filter;
        }

        if let Some(format) = format {
            match format.parse() {
                Ok(format) => config.format = format,
                Err(e) => eprintln!("{}: {}, using json", LOG_FORMAT_ENV_VAR, e),
            }
        }

        config
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_targets(mut self, enable: bool) -> Self {
        self.targets = enable;
        self
    }

    /// Filter built from the directives, falling back to `info` when they
    /// do not parse.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }

    /// Install the global subscriber.
    ///
    /// Fails if a global subscriber is already set.
    pub fn init(self) -> Result<(), TryInitError> {
        let filter = self.env_filter();

        match self.format {
            LogFormat::Json => tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_target(self.targets))
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty().with_target(self.targets))
                .try_init(),
            LogFormat::Compact => tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_target(self.targets))
                .try_init(),
        }
    }
}

/// Install the global subscriber configured from the environment.
pub fn init_from_env() -> Result<(), TryInitError> {
    LogConfig::from_env().init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.filter, "info");
        assert!(config.targets);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("json".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("Pretty".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert_eq!(" compact ".parse::<LogFormat>(), Ok(LogFormat::Compact));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_from_values() {
        let config = LogConfig::from_values(
            Some("signet_csrf=debug".to_string()),
            Some("compact".to_string()),
        );
        assert_eq!(config.filter, "signet_csrf=debug");
        assert_eq!(config.format, LogFormat::Compact);

        let config = LogConfig::from_values(Some("  ".to_string()), Some("xml".to_string()));
        assert_eq!(config, LogConfig::default());
    }

    #[test]
    fn test_builder() {
        let config = LogConfig::new()
            .format(LogFormat::Pretty)
            .with_env_filter("warn")
            .with_targets(false);
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.filter, "warn");
        assert!(!config.targets);
    }

    #[test]
    fn test_second_init_fails() {
        let _ = LogConfig::default().with_env_filter("off").init();
        assert!(LogConfig::default().init().is_err());
    }
}
