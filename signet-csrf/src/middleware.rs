use crate::codec::TokenCodec;
use crate::config::{CsrfConfig, MasterSecret};
use crate::error::{ConfigResult, CsrfError, Result};
use crate::origin::OriginChecker;
use crate::request::{CsrfRequest, CsrfResponse, TokenIssuer};
use crate::secret::SecretResolver;
use http::Method;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What the middleware did with a request that was not rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Method is ignored; no token work was done
    Skipped,
    /// A token issuer was installed on the request
    Created,
    /// The presented token (or stored secret, for XHR) checked out
    Verified,
    /// [`Outcome::Created`] followed by [`Outcome::Verified`]
    CreatedAndVerified,
}

struct Inner {
    config: CsrfConfig,
    master: MasterSecret,
    codec: TokenCodec,
    ignored: Vec<Method>,
    origin: OriginChecker,
}

/// CSRF protection middleware
///
/// Cheap to clone; all clones share one configuration and master secret.
#[derive(Clone)]
pub struct CsrfMiddleware {
    inner: Arc<Inner>,
}

impl CsrfMiddleware {
    /// Create new CSRF middleware
    pub fn new(master: MasterSecret, config: CsrfConfig) -> ConfigResult<Self> {
        config.validate()?;

        let codec = TokenCodec::new(&config.token)?;
        let ignored = config.ignored_methods()?;
        let origin = OriginChecker::new(config.host.clone());

        info!(
            name = %config.name,
            digest = %codec.digest(),
            "CSRF protection enabled"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                master,
                codec,
                ignored,
                origin,
            }),
        })
    }

    /// Create middleware from a raw master secret.
    pub fn from_secret(secret: impl Into<Vec<u8>>, config: CsrfConfig) -> ConfigResult<Self> {
        Self::new(MasterSecret::new(secret)?, config)
    }

    /// Create middleware with the master secret read from `SIGNET_CSRF_SECRET`.
    pub fn from_env(config: CsrfConfig) -> ConfigResult<Self> {
        Self::new(MasterSecret::from_default_env()?, config)
    }

    pub fn config(&self) -> &CsrfConfig {
        &self.inner.config
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.inner.codec
    }

    pub fn is_ignored(&self, method: &Method) -> bool {
        self.inner.ignored.contains(method)
    }

    fn resolver(&self) -> SecretResolver<'_> {
        SecretResolver::new(&self.inner.config, &self.inner.master, &self.inner.codec)
    }

    /// Reject requests whose `Origin`/`Referer` names a different host.
    pub fn check_origin(&self, request: &CsrfRequest<'_>) -> Result<()> {
        if self.is_ignored(&request.method) {
            return Ok(());
        }

        self.inner
            .origin
            .check(&request.headers)
            .map_err(|e| self.reject(request, e))
    }

    /// Resolve (or mint) the session secret, persist it and install a token
    /// issuer on the request. Never rejects.
    pub fn create(&self, request: &mut CsrfRequest<'_>, response: &mut CsrfResponse) -> Outcome {
        if self.is_ignored(&request.method) {
            return Outcome::Skipped;
        }

        let resolver = self.resolver();
        let secret = resolver.resolve(request);
        let persisted = resolver.persist(request, response, &secret);

        debug!(
            method = %request.method,
            minted = secret.is_minted(),
            persisted = ?persisted,
            "CSRF secret ready"
        );

        request.set_issuer(TokenIssuer::new(self.inner.codec, secret.value));
        Outcome::Created
    }

    /// Verify the token presented with the request against the stored
    /// session secret.
    ///
    /// The token is taken from the preset field, the body field, the query
    /// field, then the `x-<name>-token` header.
    pub fn verify(&self, request: &CsrfRequest<'_>) -> Result<Outcome> {
        if self.is_ignored(&request.method) {
            return Ok(Outcome::Skipped);
        }

        let token = self.presented_token(request);
        let secret = self.resolver().lookup(request);

        let (Some(token), Some(secret)) = (token, secret) else {
            return Err(self.reject(request, CsrfError::Misconfigured));
        };

        let codec = &self.inner.codec;
        let secret_ok = codec.verify(self.inner.master.expose(), &secret.value);
        let token_ok = codec.verify(secret.value.as_bytes(), token);

        if secret_ok & token_ok {
            Ok(Outcome::Verified)
        } else {
            Err(self.reject(request, CsrfError::BadToken))
        }
    }

    /// Verify only that the request carries a valid session secret.
    ///
    /// For credentialed XHR requests where the secret cookie itself is the
    /// proof.
    pub fn verify_xhr(&self, request: &CsrfRequest<'_>) -> Result<Outcome> {
        if self.is_ignored(&request.method) {
            return Ok(Outcome::Skipped);
        }

        let resolver = self.resolver();
        match resolver.lookup(request) {
            None => Err(self.reject(request, CsrfError::Misconfigured)),
            Some(secret) if resolver.is_valid(&secret.value) => Ok(Outcome::Verified),
            Some(_) => Err(self.reject(request, CsrfError::BadToken)),
        }
    }

    /// Run `create` for GET-class methods and `create` then `verify` for
    /// every other non-ignored method.
    ///
    /// On rejection the response still carries any replacement secret
    /// cookie and the request a working token issuer.
    pub fn chain(
        &self,
        request: &mut CsrfRequest<'_>,
        response: &mut CsrfResponse,
    ) -> Result<Outcome> {
        if self.is_ignored(&request.method) {
            return Ok(Outcome::Skipped);
        }

        self.create(request, response);

        if is_get_class(&request.method) {
            return Ok(Outcome::Created);
        }

        self.verify(request)?;
        Ok(Outcome::CreatedAndVerified)
    }

    fn presented_token<'r>(&self, request: &'r CsrfRequest<'_>) -> Option<&'r str> {
        let name = self.inner.config.name.as_str();

        request
            .preset_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .or_else(|| request.body_field(name).filter(|t| !t.is_empty()))
            .or_else(|| request.query_field(name).filter(|t| !t.is_empty()))
            .or_else(|| {
                request
                    .header(&self.inner.config.header_name())
                    .filter(|t| !t.is_empty())
            })
    }

    fn reject(&self, request: &CsrfRequest<'_>, error: CsrfError) -> CsrfError {
        warn!(
            method = %request.method,
            code = error.code(),
            "CSRF check failed: {}",
            error
        );
        error
    }
}

impl std::fmt::Debug for CsrfMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsrfMiddleware")
            .field("config", &self.inner.config)
            .field("codec", &self.inner.codec)
            .finish_non_exhaustive()
    }
}

/// Methods that only receive a token and are never verified.
pub fn is_get_class(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}
