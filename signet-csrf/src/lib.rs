//! # Signet CSRF Protection
//!
//! Cross-Site Request Forgery (CSRF) protection with signed tokens.
//!
//! ## Features
//!
//! - ✅ **Two-level Signing** - Master secret signs session secrets, session secrets sign tokens
//! - ✅ **Stateless Tokens** - A fresh token per call, no server-side token store
//! - ✅ **Session or Cookie** - Secret kept in the session when present, else in a cookie
//! - ✅ **Timing-safe** - Constant-time comparison of signatures
//! - ✅ **Origin Check** - Reject cross-origin form posts by `Origin`/`Referer`
//! - ✅ **Configurable** - Name, cookie attributes, digest, token lengths, ignored methods
//!
//! ## Quick Start
//!
//! ```rust
//! use signet_csrf::{CsrfConfig, CsrfMiddleware, CsrfRequest, CsrfResponse, Outcome};
//! use http::Method;
//!
//! let config = CsrfConfig::default().with_cookie_secure(false);
//! let csrf = CsrfMiddleware::from_secret("csrfSecret", config).unwrap();
//!
//! // GET: mint a secret cookie and expose a token to the page
//! let mut request = CsrfRequest::new(Method::GET);
//! let mut response = CsrfResponse::new();
//! assert_eq!(csrf.chain(&mut request, &mut response), Ok(Outcome::Created));
//!
//! let token = request.csrf_token().unwrap();
//! let secret = response.cookie("csrf").unwrap().value().to_string();
//!
//! // POST: the form sends the token back together with the cookie
//! let mut request = CsrfRequest::new(Method::POST)
//!     .with_cookies([("csrf".to_string(), secret)].into())
//!     .with_form_body([("csrf", token)]);
//! let mut response = CsrfResponse::new();
//! assert_eq!(
//!     csrf.chain(&mut request, &mut response),
//!     Ok(Outcome::CreatedAndVerified)
//! );
//! ```
//!
//! ## Rejections
//!
//! ```rust
//! use signet_csrf::{CsrfConfig, CsrfError, CsrfMiddleware, CsrfRequest, CsrfResponse};
//! use http::{Method, StatusCode};
//!
//! let csrf = CsrfMiddleware::from_secret("csrfSecret", CsrfConfig::default()).unwrap();
//!
//! let mut request = CsrfRequest::new(Method::POST);
//! let mut response = CsrfResponse::new();
//! let err = csrf.chain(&mut request, &mut response).unwrap_err();
//!
//! assert_eq!(err, CsrfError::Misconfigured);
//! assert_eq!(err.code(), "ECSRFMISCONFIG");
//! assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
//! ```
//!
//! ## Configuration Files
//!
//! ```rust
//! use signet_csrf::{CsrfConfig, Digest};
//!
//! let config = CsrfConfig::from_toml_str(r#"
//!     name = "state"
//!     ignore_methods = ["PUT"]
//!
//!     [cookie]
//!     secure = false
//!
//!     [token]
//!     digest = "sha512"
//! "#).unwrap();
//!
//! assert_eq!(config.header_name(), "x-state-token");
//! assert_eq!(config.token.digest, Digest::Sha512);
//! ```

pub mod codec;
pub mod compare;
pub mod config;
pub mod error;
pub mod middleware;
pub mod origin;
pub mod request;
pub mod secret;

pub use codec::{Digest, TokenCodec};
pub use compare::timing_safe_eq;
pub use config::{
    CookieOptions, CsrfConfig, MasterSecret, SECRET_ENV_VAR, SameSite, TokenOptions,
};
pub use error::{ConfigError, ConfigResult, CsrfError, Result};
pub use middleware::{CsrfMiddleware, Outcome};
pub use origin::OriginChecker;
pub use request::{CsrfRequest, CsrfResponse, SessionState, TokenIssuer};
pub use secret::{ResolvedSecret, SecretResolver, SecretSource};
