//! Session secret lookup, validation and persistence.

use crate::codec::TokenCodec;
use crate::config::{CsrfConfig, MasterSecret};
use crate::request::{CsrfRequest, CsrfResponse};
use cookie::Cookie;
use tracing::debug;

/// Where a session secret was found on the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSource {
    /// Set on the request by upstream middleware
    Preset,
    Session,
    Cookie,
}

impl SecretSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecretSource::Preset => "preset",
            SecretSource::Session => "session",
            SecretSource::Cookie => "cookie",
        }
    }
}

/// Raw, unvalidated secret found on a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub value: String,
    pub source: SecretSource,
}

/// How the secret returned by [`SecretResolver::resolve`] came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretOrigin {
    /// A valid secret already stored at this source
    Stored(SecretSource),
    /// Freshly minted; `replaced` names the source of a discarded invalid
    /// candidate, if there was one
    Minted { replaced: Option<SecretSource> },
}

/// A valid session secret for the current request.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedSecret {
    pub value: String,
    pub origin: SecretOrigin,
}

impl ResolvedSecret {
    /// Source of the valid stored secret; `None` for a minted one.
    pub fn source(&self) -> Option<SecretSource> {
        match self.origin {
            SecretOrigin::Stored(source) => Some(source),
            SecretOrigin::Minted { .. } => None,
        }
    }

    pub fn is_minted(&self) -> bool {
        matches!(self.origin, SecretOrigin::Minted { .. })
    }
}

impl std::fmt::Debug for ResolvedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecret")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// Where a secret was written by [`SecretResolver::persist`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persisted {
    Session,
    Cookie,
    /// Already stored where it belongs
    Unchanged,
}

/// Resolves and persists the per-principal session secret.
pub struct SecretResolver<'a> {
    config: &'a CsrfConfig,
    master: &'a MasterSecret,
    codec: &'a TokenCodec,
}

impl<'a> SecretResolver<'a> {
    pub fn new(config: &'a CsrfConfig, master: &'a MasterSecret, codec: &'a TokenCodec) -> Self {
        Self {
            config,
            master,
            codec,
        }
    }

    /// First candidate in lookup order: preset value, session field, cookie.
    pub fn lookup(&self, request: &CsrfRequest<'_>) -> Option<Candidate> {
        let name = self.config.name.as_str();

        let candidate = |value: Option<String>, source| {
            value
                .filter(|v| !v.is_empty())
                .map(|value| Candidate { value, source })
        };

        candidate(request.preset_secret.clone(), SecretSource::Preset)
            .or_else(|| candidate(request.session_value(name), SecretSource::Session))
            .or_else(|| candidate(request.cookie(name), SecretSource::Cookie))
    }

    /// Whether `secret` was signed with the master secret.
    pub fn is_valid(&self, secret: &str) -> bool {
        self.codec.verify(self.master.expose(), secret)
    }

    /// Return the stored secret if it is valid, otherwise mint a new one.
    pub fn resolve(&self, request: &CsrfRequest<'_>) -> ResolvedSecret {
        let replaced = match self.lookup(request) {
            Some(candidate) if self.is_valid(&candidate.value) => {
                return ResolvedSecret {
                    value: candidate.value,
                    origin: SecretOrigin::Stored(candidate.source),
                };
            }
            Some(candidate) => {
                debug!(
                    source = candidate.source.as_str(),
                    "Discarding invalid CSRF secret"
                );
                Some(candidate.source)
            }
            None => None,
        };

        debug!("Minting new CSRF secret");
        ResolvedSecret {
            value: self.codec.sign(self.master.expose()),
            origin: SecretOrigin::Minted { replaced },
        }
    }

    /// Store the secret in the session when there is one, else in a cookie
    /// unless the request already carried it in a valid cookie.
    pub fn persist(
        &self,
        request: &mut CsrfRequest<'_>,
        response: &mut CsrfResponse,
        secret: &ResolvedSecret,
    ) -> Persisted {
        let name = self.config.name.as_str();

        if let Some(session) = request.session.as_mut() {
            if secret.source() == Some(SecretSource::Session) {
                return Persisted::Unchanged;
            }
            session.set_value(name, secret.value.clone());
            debug!("Stored CSRF secret in session");
            return Persisted::Session;
        }

        if secret.source() == Some(SecretSource::Cookie) {
            return Persisted::Unchanged;
        }

        response.set_cookie(self.cookie(secret.value.clone()));
        debug!(cookie = name, "Set CSRF secret cookie");
        Persisted::Cookie
    }

    fn cookie(&self, value: String) -> Cookie<'static> {
        let options = &self.config.cookie;

        let mut builder = Cookie::build((self.config.name.clone(), value))
            .path(options.path.clone())
            .http_only(options.http_only)
            .secure(options.secure)
            .same_site(options.same_site.into());

        if let Some(domain) = &options.domain {
            builder = builder.domain(domain.clone());
        }

        if let Some(max_age) = options.max_age {
            builder = builder.max_age(cookie::time::Duration::seconds(max_age));
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, HeaderValue, Method, header};
    use std::collections::HashMap;

    struct Fixture {
        config: CsrfConfig,
        master: MasterSecret,
        codec: TokenCodec,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                config: CsrfConfig::default().with_cookie_secure(false),
                master: MasterSecret::new("ssshhh").unwrap(),
                codec: TokenCodec::default(),
            }
        }

        fn resolver(&self) -> SecretResolver<'_> {
            SecretResolver::new(&self.config, &self.master, &self.codec)
        }

        fn valid_secret(&self) -> String {
            self.codec.sign(self.master.expose())
        }
    }

    fn with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("csrf={}", value)).unwrap(),
        );
        headers
    }

    #[test]
    fn test_lookup_order() {
        let fx = Fixture::new();
        let resolver = fx.resolver();
        let mut session = HashMap::from([("csrf".to_string(), "from-session".to_string())]);

        let request = CsrfRequest::new(Method::GET)
            .with_headers(with_cookie("from-cookie"))
            .with_session(&mut session)
            .with_preset_secret("from-preset");
        assert_eq!(
            resolver.lookup(&request).map(|c| c.source),
            Some(SecretSource::Preset)
        );

        let mut session = HashMap::from([("csrf".to_string(), "from-session".to_string())]);
        let request = CsrfRequest::new(Method::GET)
            .with_headers(with_cookie("from-cookie"))
            .with_session(&mut session);
        assert_eq!(
            resolver.lookup(&request).map(|c| c.source),
            Some(SecretSource::Session)
        );

        let request = CsrfRequest::new(Method::GET).with_headers(with_cookie("from-cookie"));
        assert_eq!(
            resolver.lookup(&request),
            Some(Candidate {
                value: "from-cookie".to_string(),
                source: SecretSource::Cookie,
            })
        );

        assert_eq!(resolver.lookup(&CsrfRequest::new(Method::GET)), None);
    }

    #[test]
    fn test_resolve_keeps_valid_cookie() {
        let fx = Fixture::new();
        let secret = fx.valid_secret();
        let request = CsrfRequest::new(Method::GET).with_headers(with_cookie(&secret));

        let resolved = fx.resolver().resolve(&request);
        assert_eq!(resolved.value, secret);
        assert_eq!(resolved.origin, SecretOrigin::Stored(SecretSource::Cookie));
    }

    #[test]
    fn test_resolve_replaces_invalid_cookie() {
        let fx = Fixture::new();
        let request = CsrfRequest::new(Method::GET).with_headers(with_cookie("bad"));

        let resolved = fx.resolver().resolve(&request);
        assert!(resolved.is_minted());
        assert_eq!(
            resolved.origin,
            SecretOrigin::Minted {
                replaced: Some(SecretSource::Cookie)
            }
        );
        assert_eq!(resolved.source(), None);
        assert!(fx.resolver().is_valid(&resolved.value));
    }

    #[test]
    fn test_secret_signed_by_other_master_is_invalid() {
        let fx = Fixture::new();
        let foreign = fx.codec.sign(b"another master");
        assert!(!fx.resolver().is_valid(&foreign));
    }

    #[test]
    fn test_persist_to_cookie_when_no_session() {
        let fx = Fixture::new();
        let resolver = fx.resolver();
        let mut request = CsrfRequest::new(Method::GET);
        let mut response = CsrfResponse::new();

        let resolved = resolver.resolve(&request);
        let persisted = resolver.persist(&mut request, &mut response, &resolved);

        assert_eq!(persisted, Persisted::Cookie);
        let cookie = response.cookie("csrf").unwrap();
        assert_eq!(cookie.value(), resolved.value);
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(cookie::SameSite::Strict));
    }

    #[test]
    fn test_persist_skips_valid_cookie() {
        let fx = Fixture::new();
        let resolver = fx.resolver();
        let secret = fx.valid_secret();
        let mut request = CsrfRequest::new(Method::GET).with_headers(with_cookie(&secret));
        let mut response = CsrfResponse::new();

        let resolved = resolver.resolve(&request);
        assert_eq!(
            resolver.persist(&mut request, &mut response, &resolved),
            Persisted::Unchanged
        );
        assert!(response.cookies().is_empty());
    }

    #[test]
    fn test_persist_to_session_is_idempotent() {
        let fx = Fixture::new();
        let resolver = fx.resolver();
        let mut session: HashMap<String, String> = HashMap::new();
        let mut response = CsrfResponse::new();

        let first = {
            let mut request = CsrfRequest::new(Method::GET).with_session(&mut session);
            let resolved = resolver.resolve(&request);
            assert_eq!(
                resolver.persist(&mut request, &mut response, &resolved),
                Persisted::Session
            );
            resolved.value
        };
        assert_eq!(session.get("csrf"), Some(&first));

        let mut request = CsrfRequest::new(Method::GET).with_session(&mut session);
        let resolved = resolver.resolve(&request);
        assert_eq!(resolved.value, first);
        assert_eq!(
            resolver.persist(&mut request, &mut response, &resolved),
            Persisted::Unchanged
        );
        assert!(response.cookies().is_empty());
    }

    #[test]
    fn test_cookie_attributes() {
        let mut fx = Fixture::new();
        fx.config = fx
            .config
            .clone()
            .with_name("state")
            .with_cookie_domain("good.example")
            .with_cookie_max_age(3600)
            .with_cookie_path("/app");

        let resolver = fx.resolver();
        let mut request = CsrfRequest::new(Method::GET);
        let mut response = CsrfResponse::new();
        let resolved = resolver.resolve(&request);
        resolver.persist(&mut request, &mut response, &resolved);

        let cookie = response.cookie("state").unwrap();
        assert_eq!(cookie.domain(), Some("good.example"));
        assert_eq!(cookie.path(), Some("/app"));
        assert_eq!(
            cookie.max_age(),
            Some(cookie::time::Duration::seconds(3600))
        );
        assert_eq!(cookie.secure(), Some(false));
    }
}
