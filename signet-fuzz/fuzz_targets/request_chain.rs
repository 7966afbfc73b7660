//! Fuzz target for the full middleware chain.
//!
//! Arbitrary cookies, tokens and methods must produce an outcome or a
//! rejection, never a panic.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use http::{HeaderMap, HeaderValue, Method, header};
use signet_csrf::{CsrfConfig, CsrfMiddleware, CsrfRequest, CsrfResponse};
use std::sync::OnceLock;

#[derive(Debug, Arbitrary)]
struct FuzzRequest {
    method: String,
    cookie: String,
    body_token: Option<String>,
    header_token: Option<String>,
    preset_secret: Option<String>,
}

fn middleware() -> &'static CsrfMiddleware {
    static CSRF: OnceLock<CsrfMiddleware> = OnceLock::new();
    CSRF.get_or_init(|| {
        CsrfMiddleware::from_secret("fuzzSecret", CsrfConfig::default()).unwrap()
    })
}

fuzz_target!(|data: FuzzRequest| {
    let Ok(method) = Method::from_bytes(data.method.as_bytes()) else {
        return;
    };

    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&data.cookie) {
        headers.insert(header::COOKIE, value);
    }
    if let Some(value) = data
        .header_token
        .as_deref()
        .and_then(|v| HeaderValue::from_str(v).ok())
    {
        headers.insert("x-csrf-token", value);
    }

    let mut request = CsrfRequest::new(method).with_headers(headers);
    if let Some(token) = data.body_token {
        request = request.with_form_body([("csrf", token)]);
    }
    if let Some(secret) = data.preset_secret {
        request = request.with_preset_secret(secret);
    }

    let csrf = middleware();
    let mut response = CsrfResponse::new();
    let _ = csrf.chain(&mut request, &mut response);
    let _ = csrf.verify_xhr(&request);

    // Any request that was not skipped can issue a token afterwards
    if !csrf.is_ignored(&request.method) {
        assert!(request.csrf_token().is_some());
    }
});
