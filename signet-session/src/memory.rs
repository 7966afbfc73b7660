//! In-process session storage.

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::traits::{Session, SessionStore, generate_session_id};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Session store keeping sessions in memory.
///
/// Clones share the same sessions. Suited to a single process; sessions are
/// lost on restart.
///
/// # Examples
///
/// ```
/// use signet_session::{MemorySessionStore, SessionConfig, SessionStore};
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = SessionConfig::default().with_default_ttl(Duration::from_secs(600));
/// let store = MemorySessionStore::new(config)?;
///
/// let session = store.create(None).await?;
/// assert!(store.exists(&session.id).await?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    config: SessionConfig,
}

impl MemorySessionStore {
    /// Create a new memory session store.
    pub fn new(config: SessionConfig) -> SessionResult<Self> {
        config.validate()?;
        Ok(Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            config,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            config: SessionConfig::default(),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, ttl: Option<Duration>) -> SessionResult<Session> {
        let ttl = self.config.effective_ttl(ttl);
        let session = Session::new(generate_session_id(), ttl);

        self.save(&session).await?;
        debug!(session_id = %session.id, ttl_secs = ttl.as_secs(), "Created session");

        Ok(session)
    }

    async fn get(&self, session_id: &str) -> SessionResult<Option<Session>> {
        if session_id.is_empty() {
            return Err(SessionError::InvalidSessionId(
                "session ID must not be empty".to_string(),
            ));
        }

        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(session_id)
            .filter(|session| !session.is_expired())
            .cloned())
    }

    async fn save(&self, session: &Session) -> SessionResult<()> {
        if session.is_expired() {
            return Err(SessionError::Expired(session.id.clone()));
        }

        let mut session = session.clone();

        // Enforce max TTL
        let max_ttl = chrono::Duration::from_std(self.config.max_ttl).unwrap_or_default();
        let latest = Utc::now() + max_ttl;
        if session.expires_at > latest {
            session.expires_at = latest;
        }

        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session);
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> SessionResult<()> {
        if self.sessions.write().await.remove(session_id).is_some() {
            debug!(session_id, "Deleted session");
        }
        Ok(())
    }

    async fn exists(&self, session_id: &str) -> SessionResult<bool> {
        Ok(self.get(session_id).await?.is_some())
    }

    async fn count(&self) -> SessionResult<usize> {
        let sessions = self.sessions.read().await;
        Ok(sessions.values().filter(|s| !s.is_expired()).count())
    }

    async fn cleanup_expired(&self) -> SessionResult<usize> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired());

        let removed = before - sessions.len();
        if removed > 0 {
            debug!(removed, "Removed expired sessions");
        }
        Ok(removed)
    }
}
