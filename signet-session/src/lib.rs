//! Session storage for signet.
//!
//! When a request has a session, CSRF protection keeps the session secret in
//! it instead of a cookie. [`Session`] implements
//! [`SessionState`](signet_csrf::SessionState), so a loaded session can be
//! handed straight to [`CsrfRequest::with_session`](signet_csrf::CsrfRequest::with_session).
//!
//! # Examples
//!
//! ```
//! use signet_csrf::{CsrfConfig, CsrfMiddleware, CsrfRequest, CsrfResponse};
//! use signet_session::*;
//! use http::Method;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemorySessionStore::new(SessionConfig::default())?;
//!     let csrf = CsrfMiddleware::from_secret("csrfSecret", CsrfConfig::default())?;
//!
//!     let mut session = store.create(None).await?;
//!
//!     let mut response = CsrfResponse::new();
//!     let token = {
//!         let mut request = CsrfRequest::new(Method::GET).with_session(&mut session);
//!         csrf.chain(&mut request, &mut response)?;
//!         request.csrf_token()
//!     };
//!     store.save(&session).await?;
//!
//!     // Secret went to the session, not to a cookie
//!     assert!(token.is_some());
//!     assert!(response.cookies().is_empty());
//!     assert!(session.contains("csrf"));
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod memory;
pub mod traits;

pub use config::SessionConfig;
pub use error::{SessionError, SessionResult};
pub use memory::MemorySessionStore;
pub use traits::{Session, SessionStore, generate_session_id};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::SessionConfig;
    pub use crate::error::{SessionError, SessionResult};
    pub use crate::memory::MemorySessionStore;
    pub use crate::traits::{Session, SessionStore, generate_session_id};
}
