use http::{HeaderValue, Response, StatusCode, header};
use serde_json::json;
use thiserror::Error;

/// A request rejected by CSRF protection.
///
/// Every rejection is terminal for the request and maps to `403 Forbidden`
/// with a machine-readable [`code`](CsrfError::code).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrfError {
    /// Origin or referrer present but inconsistent with the serving host.
    #[error("bad origin")]
    BadOrigin,

    /// Verification attempted without a presented token or resolvable secret.
    #[error("misconfigured csrf")]
    Misconfigured,

    /// The token/secret combination failed authenticity verification.
    #[error("bad csrf token")]
    BadToken,
}

impl CsrfError {
    pub fn code(&self) -> &'static str {
        match self {
            CsrfError::BadOrigin => "ECSRFBADORIGIN",
            CsrfError::Misconfigured => "ECSRFMISCONFIG",
            CsrfError::BadToken => "ECSRFBADTOKEN",
        }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::FORBIDDEN
    }

    /// JSON error body: `{"error": <message>, "code": <code>}`.
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "error": self.to_string(),
            "code": self.code(),
        })
    }

    /// Build a `403` response carrying the JSON error body.
    pub fn into_response(self) -> Response<String> {
        let mut response = Response::new(self.to_json().to_string());
        *response.status_mut() = self.status();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        response
    }
}

/// Result of a CSRF check.
pub type Result<T> = std::result::Result<T, CsrfError>;

/// Errors raised while building or loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("need a secret")]
    MissingSecret,

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(CsrfError::BadOrigin.code(), "ECSRFBADORIGIN");
        assert_eq!(CsrfError::Misconfigured.code(), "ECSRFMISCONFIG");
        assert_eq!(CsrfError::BadToken.code(), "ECSRFBADTOKEN");
    }

    #[test]
    fn test_all_forbidden() {
        for err in [
            CsrfError::BadOrigin,
            CsrfError::Misconfigured,
            CsrfError::BadToken,
        ] {
            assert_eq!(err.status(), StatusCode::FORBIDDEN);
        }
    }

    #[test]
    fn test_error_response() {
        let response = CsrfError::BadToken.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body: serde_json::Value = serde_json::from_str(response.body()).unwrap();
        assert_eq!(body["code"], "ECSRFBADTOKEN");
        assert_eq!(body["error"], "bad csrf token");
    }
}
