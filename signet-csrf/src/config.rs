use crate::codec::{Digest, TokenCodec};
use crate::error::{ConfigError, ConfigResult};
use crate::origin::split_host;
use http::Method;
use rand::RngCore;
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, SecretBox};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Environment variable read by [`MasterSecret::from_default_env`].
pub const SECRET_ENV_VAR: &str = "SIGNET_CSRF_SECRET";

/// Methods that bypass every check regardless of configuration.
pub const ALWAYS_IGNORED_METHODS: [Method; 2] = [Method::HEAD, Method::OPTIONS];

/// Server-side root key used to sign session secrets.
///
/// Never leaves the process: it is redacted from `Debug` output and zeroized
/// when dropped.
pub struct MasterSecret(SecretBox<[u8]>);

impl MasterSecret {
    /// Wrap operator-supplied key material. An empty secret is rejected.
    pub fn new(secret: impl Into<Vec<u8>>) -> ConfigResult<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        Ok(Self(SecretBox::new(secret.into_boxed_slice())))
    }

    /// Read the secret from an environment variable.
    pub fn from_env(var: &str) -> ConfigResult<Self> {
        match std::env::var(var) {
            Ok(value) => Self::new(value),
            Err(std::env::VarError::NotPresent) => Err(ConfigError::MissingSecret),
            Err(e) => Err(ConfigError::Env(e)),
        }
    }

    /// Read the secret from `SIGNET_CSRF_SECRET`.
    pub fn from_default_env() -> ConfigResult<Self> {
        Self::from_env(SECRET_ENV_VAR)
    }

    /// Generate a random 32-byte secret.
    ///
    /// Secrets generated this way do not survive a restart, so every session
    /// secret and token issued before the restart becomes invalid.
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        Self(SecretBox::new(bytes.into_boxed_slice()))
    }

    pub(crate) fn expose(&self) -> &[u8] {
        self.0.expose_secret()
    }
}

impl fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterSecret([REDACTED])")
    }
}

/// Cookie SameSite attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    #[default]
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

impl From<SameSite> for cookie::SameSite {
    fn from(value: SameSite) -> Self {
        match value {
            SameSite::Strict => cookie::SameSite::Strict,
            SameSite::Lax => cookie::SameSite::Lax,
            SameSite::None => cookie::SameSite::None,
        }
    }
}

/// Attributes of the cookie carrying the session secret when no session is
/// available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieOptions {
    pub path: String,
    pub domain: Option<String>,
    pub http_only: bool,
    /// Send over HTTPS only
    pub secure: bool,
    pub same_site: SameSite,
    /// Lifetime in seconds; a session cookie when unset
    pub max_age: Option<i64>,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            domain: None,
            http_only: true,
            secure: true,
            same_site: SameSite::Strict,
            max_age: None,
        }
    }
}

/// Signed-token codec parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenOptions {
    pub digest: Digest,
    /// Length of the nonce segment
    pub common_len: usize,
    /// Total token length
    pub token_len: usize,
}

impl Default for TokenOptions {
    fn default() -> Self {
        Self {
            digest: Digest::Sha256,
            common_len: 24,
            token_len: 48,
        }
    }
}

/// CSRF protection configuration
///
/// Immutable once handed to [`CsrfMiddleware`](crate::CsrfMiddleware). The
/// master secret is supplied separately and never read from here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsrfConfig {
    /// Session key, cookie name, body/query field and header discriminator
    pub name: String,

    pub cookie: CookieOptions,

    pub token: TokenOptions,

    /// Methods skipped in addition to HEAD and OPTIONS
    pub ignore_methods: Vec<String>,

    /// Host to check origins against instead of the request headers
    pub host: Option<String>,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            name: "csrf".to_string(),
            cookie: CookieOptions::default(),
            token: TokenOptions::default(),
            ignore_methods: Vec::new(),
            host: None,
        }
    }
}

impl CsrfConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document.
    ///
    /// ```
    /// use signet_csrf::CsrfConfig;
    ///
    /// let config = CsrfConfig::from_toml_str(r#"
    ///     name = "state"
    ///     ignore_methods = ["DELETE"]
    ///
    ///     [cookie]
    ///     secure = false
    /// "#).unwrap();
    ///
    /// assert_eq!(config.name, "state");
    /// assert!(!config.cookie.secure);
    /// assert_eq!(config.token.token_len, 48);
    /// ```
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("TOML parse error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document.
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("JSON parse error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.toml` or `.json` file, chosen by extension.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ConfigError::Parse("No file extension found".to_string()))?;

        let content = std::fs::read_to_string(path)?;

        match ext.to_lowercase().as_str() {
            "toml" => Self::from_toml_str(&content),
            "json" => Self::from_json_str(&content),
            other => Err(ConfigError::Parse(format!("Unsupported format: {}", other))),
        }
    }

    /// Set the name used for the session key, cookie, field and header
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_cookie(mut self, cookie: CookieOptions) -> Self {
        self.cookie = cookie;
        self
    }

    /// Set cookie path
    pub fn with_cookie_path(mut self, path: impl Into<String>) -> Self {
        self.cookie.path = path.into();
        self
    }

    /// Set cookie domain
    pub fn with_cookie_domain(mut self, domain: impl Into<String>) -> Self {
        self.cookie.domain = Some(domain.into());
        self
    }

    /// Set cookie secure flag
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie.secure = secure;
        self
    }

    /// Set cookie HttpOnly flag
    pub fn with_cookie_http_only(mut self, http_only: bool) -> Self {
        self.cookie.http_only = http_only;
        self
    }

    /// Set cookie SameSite policy
    pub fn with_cookie_same_site(mut self, same_site: SameSite) -> Self {
        self.cookie.same_site = same_site;
        self
    }

    pub fn with_cookie_max_age(mut self, seconds: i64) -> Self {
        self.cookie.max_age = Some(seconds);
        self
    }

    pub fn with_token(mut self, token: TokenOptions) -> Self {
        self.token = token;
        self
    }

    pub fn with_digest(mut self, digest: Digest) -> Self {
        self.token.digest = digest;
        self
    }

    /// Skip these methods in addition to HEAD and OPTIONS
    pub fn with_ignore_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_methods.extend(methods.into_iter().map(Into::into));
        self
    }

    /// Check origins against this host instead of `X-Forwarded-Host`/`Host`
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Header carrying a presented token: `x-<name>-token`.
    pub fn header_name(&self) -> String {
        format!("x-{}-token", self.name.to_ascii_lowercase())
    }

    /// Every ignored method, HEAD and OPTIONS included.
    pub fn ignored_methods(&self) -> ConfigResult<Vec<Method>> {
        let mut methods = ALWAYS_IGNORED_METHODS.to_vec();
        for name in &self.ignore_methods {
            let method = Method::from_bytes(name.trim().to_ascii_uppercase().as_bytes())
                .map_err(|_| ConfigError::Invalid(format!("invalid HTTP method '{}'", name)))?;
            if !methods.contains(&method) {
                methods.push(method);
            }
        }
        Ok(methods)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.name.is_empty() {
            return Err(ConfigError::Invalid("name must not be empty".to_string()));
        }

        if !self
            .name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(ConfigError::Invalid(format!(
                "name '{}' may only contain ASCII letters, digits, '-' and '_'",
                self.name
            )));
        }

        if let Some(host) = &self.host {
            if host.trim().is_empty() {
                return Err(ConfigError::Invalid("host must not be empty".to_string()));
            }
            if split_host(host).is_none() {
                return Err(ConfigError::Invalid(format!(
                    "host '{}' must be a hostname with an optional port",
                    host
                )));
            }
        }

        self.ignored_methods()?;
        TokenCodec::new(&self.token)?;

        Ok(())
    }
}
