//! Request and response state handed to the middleware.
//!
//! The surrounding pipeline owns parsing (body, query, cookies) and session
//! storage; these types only carry the pieces CSRF protection reads and
//! writes.

use crate::codec::TokenCodec;
use cookie::Cookie;
use http::header::{self, HeaderMap, HeaderValue};
use http::{Method, request::Parts};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// Read/write contract of a session object.
///
/// Implemented by session types from the surrounding framework; the
/// middleware reads and writes a single string field.
pub trait SessionState: Send {
    fn get_value(&self, key: &str) -> Option<String>;

    fn set_value(&mut self, key: &str, value: String);
}

impl SessionState for HashMap<String, String> {
    fn get_value(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }

    fn set_value(&mut self, key: &str, value: String) {
        self.insert(key.to_string(), value);
    }
}

/// Issues request tokens for one resolved session secret.
///
/// Each call to [`issue`](TokenIssuer::issue) returns a new token; nothing is
/// cached.
#[derive(Clone)]
pub struct TokenIssuer {
    codec: TokenCodec,
    secret: String,
}

impl TokenIssuer {
    pub(crate) fn new(codec: TokenCodec, secret: String) -> Self {
        Self { codec, secret }
    }

    pub fn issue(&self) -> String {
        self.codec.sign(self.secret.as_bytes())
    }
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

/// Incoming request as seen by CSRF protection.
pub struct CsrfRequest<'s> {
    pub method: Method,
    pub headers: HeaderMap,
    /// Parsed query parameters
    pub query: HashMap<String, String>,
    /// Parsed request body, if an upstream body parser ran
    pub body: Option<Value>,
    /// Cookies parsed upstream; the `Cookie` header is parsed when unset
    pub cookies: Option<HashMap<String, String>>,
    /// Token placed on the request by custom upstream middleware
    pub preset_token: Option<String>,
    /// Secret placed on the request by custom upstream middleware
    pub preset_secret: Option<String>,
    /// Session of the current principal, when sessions are in use
    pub session: Option<&'s mut dyn SessionState>,
    issuer: Option<TokenIssuer>,
}

impl<'s> CsrfRequest<'s> {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: HeaderMap::new(),
            query: HashMap::new(),
            body: None,
            cookies: None,
            preset_token: None,
            preset_secret: None,
            session: None,
            issuer: None,
        }
    }

    /// Build from the head of an `http` request; the query string of the URI
    /// is parsed into [`query`](Self::query).
    pub fn from_parts(parts: &Parts) -> Self {
        let query = parts
            .uri
            .query()
            .and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
            .map(|pairs| pairs.into_iter().collect())
            .unwrap_or_default();

        Self {
            headers: parts.headers.clone(),
            query,
            ..Self::new(parts.method.clone())
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_query(mut self, query: HashMap<String, String>) -> Self {
        self.query = query;
        self
    }

    /// Attach a parsed JSON body.
    pub fn with_json_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach a parsed form body.
    pub fn with_form_body<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: Map<String, Value> = fields
            .into_iter()
            .map(|(k, v)| (k.into(), Value::String(v.into())))
            .collect();
        self.body = Some(Value::Object(map));
        self
    }

    pub fn with_cookies(mut self, cookies: HashMap<String, String>) -> Self {
        self.cookies = Some(cookies);
        self
    }

    pub fn with_preset_token(mut self, token: impl Into<String>) -> Self {
        self.preset_token = Some(token.into());
        self
    }

    pub fn with_preset_secret(mut self, secret: impl Into<String>) -> Self {
        self.preset_secret = Some(secret.into());
        self
    }

    pub fn with_session(mut self, session: &'s mut dyn SessionState) -> Self {
        self.session = Some(session);
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Cookie value by name.
    pub fn cookie(&self, name: &str) -> Option<String> {
        if let Some(cookies) = &self.cookies {
            return cookies.get(name).cloned();
        }

        self.headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| Cookie::split_parse(value))
            .filter_map(|cookie| cookie.ok())
            .find(|cookie| cookie.name() == name)
            .map(|cookie| cookie.value().to_string())
    }

    /// String field of the parsed body.
    pub fn body_field(&self, name: &str) -> Option<&str> {
        self.body.as_ref()?.get(name)?.as_str()
    }

    pub fn query_field(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn session_value(&self, key: &str) -> Option<String> {
        self.session.as_ref()?.get_value(key)
    }

    /// Token issuer installed by [`CsrfMiddleware::create`](crate::CsrfMiddleware::create).
    pub fn token_issuer(&self) -> Option<&TokenIssuer> {
        self.issuer.as_ref()
    }

    /// A fresh request token, or `None` when `create` has not run for this
    /// request.
    pub fn csrf_token(&self) -> Option<String> {
        self.issuer.as_ref().map(TokenIssuer::issue)
    }

    pub(crate) fn set_issuer(&mut self, issuer: TokenIssuer) {
        self.issuer = Some(issuer);
    }
}

impl fmt::Debug for CsrfRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsrfRequest")
            .field("method", &self.method)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("has_session", &self.session.is_some())
            .field("has_issuer", &self.issuer.is_some())
            .finish_non_exhaustive()
    }
}

/// Response-side effects of CSRF protection.
#[derive(Debug, Default, Clone)]
pub struct CsrfResponse {
    cookies: Vec<Cookie<'static>>,
}

impl CsrfResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_cookie(&mut self, cookie: Cookie<'static>) {
        self.cookies.push(cookie);
    }

    pub fn cookies(&self) -> &[Cookie<'static>] {
        &self.cookies
    }

    pub fn cookie(&self, name: &str) -> Option<&Cookie<'static>> {
        self.cookies.iter().rev().find(|c| c.name() == name)
    }

    /// Append a `Set-Cookie` header per cookie, keeping headers already set
    /// by other middleware.
    pub fn apply_to(&self, headers: &mut HeaderMap) {
        for cookie in &self.cookies {
            match HeaderValue::try_from(cookie.to_string()) {
                Ok(value) => {
                    headers.append(header::SET_COOKIE, value);
                }
                Err(e) => {
                    tracing::error!(cookie = cookie.name(), error = %e, "Unencodable Set-Cookie value");
                }
            }
        }
    }
}
