// Signet - signed-token CSRF protection for HTTP services
//
// This library wires the CSRF middleware, optional session storage and a
// tracing subscriber bootstrap behind a single dependency.

// Re-export core functionality
pub use signet_csrf::*;

// Re-export optional crates
#[cfg(feature = "session")]
pub use signet_session;

pub mod logging;

// Prelude for common imports
pub mod prelude {
    pub use crate::logging::{LogConfig, LogFormat};
    pub use crate::{
        CookieOptions, CsrfConfig, CsrfError, CsrfMiddleware, CsrfRequest, CsrfResponse, Digest,
        MasterSecret, Outcome, SameSite, SessionState, TokenOptions,
    };

    #[cfg(feature = "session")]
    pub use signet_session::{MemorySessionStore, Session, SessionConfig, SessionStore};
}
