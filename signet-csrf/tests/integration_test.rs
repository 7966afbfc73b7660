//! Integration tests for signet-csrf

use http::{HeaderMap, HeaderValue, Method, Request, StatusCode, header};
use signet_csrf::*;
use std::collections::HashMap;

fn csrf() -> CsrfMiddleware {
    let config = CsrfConfig::default().with_cookie_secure(false);
    CsrfMiddleware::from_secret("csrfSecret", config).unwrap()
}

/// Carry `Set-Cookie` headers of a response into a `Cookie` header.
fn cookie_jar(response: &CsrfResponse) -> HeaderMap {
    let mut set = HeaderMap::new();
    response.apply_to(&mut set);

    let pairs: Vec<String> = set
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .map(str::to_string)
        .collect();

    let mut headers = HeaderMap::new();
    if !pairs.is_empty() {
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&pairs.join("; ")).unwrap(),
        );
    }
    headers
}

#[test]
fn test_csrf_config_defaults() {
    let config = CsrfConfig::default();
    assert_eq!(config.name, "csrf");
    assert_eq!(config.header_name(), "x-csrf-token");
    assert_eq!(config.cookie.path, "/");
    assert!(config.cookie.http_only);
    assert!(config.cookie.secure);
    assert_eq!(config.cookie.same_site, SameSite::Strict);
    assert_eq!(config.token, TokenOptions::default());
}

#[test]
fn test_csrf_same_site_enum() {
    assert_eq!(SameSite::Strict.as_str(), "Strict");
    assert_eq!(SameSite::Lax.as_str(), "Lax");
    assert_eq!(SameSite::None.as_str(), "None");
}

#[test]
fn test_missing_master_secret() {
    assert!(matches!(
        MasterSecret::new(Vec::<u8>::new()),
        Err(ConfigError::MissingSecret)
    ));
}

#[test]
fn test_invalid_config_rejected() {
    let config = CsrfConfig::default().with_name("bad name");
    assert!(CsrfMiddleware::from_secret("s", config).is_err());

    let config = CsrfConfig::default().with_ignore_methods(["NOT A METHOD"]);
    assert!(CsrfMiddleware::from_secret("s", config).is_err());
}

#[test]
fn test_form_round_trip_over_http() {
    let csrf = csrf();

    let (parts, ()) = Request::builder()
        .method(Method::GET)
        .uri("/form")
        .body(())
        .unwrap()
        .into_parts();
    let mut request = CsrfRequest::from_parts(&parts);
    let mut response = CsrfResponse::new();
    assert_eq!(csrf.chain(&mut request, &mut response), Ok(Outcome::Created));
    let token = request.csrf_token().unwrap();

    let mut builder = Request::builder().method(Method::POST).uri("/submit");
    for (name, value) in cookie_jar(&response).iter() {
        builder = builder.header(name, value);
    }
    let (parts, ()) = builder.body(()).unwrap().into_parts();

    let mut request = CsrfRequest::from_parts(&parts).with_form_body([("csrf", token)]);
    let mut response = CsrfResponse::new();
    assert_eq!(
        csrf.chain(&mut request, &mut response),
        Ok(Outcome::CreatedAndVerified)
    );
    assert!(response.cookies().is_empty());
}

#[test]
fn test_token_in_query_string() {
    let csrf = csrf();

    let mut request = CsrfRequest::new(Method::GET);
    let mut response = CsrfResponse::new();
    csrf.chain(&mut request, &mut response).unwrap();
    let token = request.csrf_token().unwrap();

    let mut builder = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/items/1?csrf={}", token));
    for (name, value) in cookie_jar(&response).iter() {
        builder = builder.header(name, value);
    }
    let (parts, ()) = builder.body(()).unwrap().into_parts();

    let mut request = CsrfRequest::from_parts(&parts);
    let mut response = CsrfResponse::new();
    assert_eq!(
        csrf.chain(&mut request, &mut response),
        Ok(Outcome::CreatedAndVerified)
    );
}

#[test]
fn test_cross_origin_post_rejected() {
    let csrf = csrf();

    let (parts, ()) = Request::builder()
        .method(Method::POST)
        .uri("/submit")
        .header(header::HOST, "good.example")
        .header(header::ORIGIN, "https://evil.example")
        .body(())
        .unwrap()
        .into_parts();
    let request = CsrfRequest::from_parts(&parts);

    let err = csrf.check_origin(&request).unwrap_err();
    assert_eq!(err.code(), "ECSRFBADORIGIN");

    let response = err.into_response();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
}

#[test]
fn test_same_origin_post_accepted() {
    let csrf = csrf();

    let (parts, ()) = Request::builder()
        .method(Method::POST)
        .uri("/submit")
        .header(header::HOST, "good.example")
        .header(header::REFERER, "https://good.example/form")
        .body(())
        .unwrap()
        .into_parts();
    let request = CsrfRequest::from_parts(&parts);

    assert_eq!(csrf.check_origin(&request), Ok(()));
}

#[test]
fn test_stale_cookie_recovery() {
    let csrf = csrf();
    let mut cookies = HashMap::from([("csrf".to_string(), "stale-secret".to_string())]);

    let mut request = CsrfRequest::new(Method::POST)
        .with_cookies(cookies.clone())
        .with_form_body([("csrf", "stale-token")]);
    let mut response = CsrfResponse::new();
    assert_eq!(
        csrf.chain(&mut request, &mut response),
        Err(CsrfError::BadToken)
    );

    let fresh_secret = response.cookie("csrf").unwrap().value().to_string();
    let fresh_token = request.csrf_token().unwrap();
    cookies.insert("csrf".to_string(), fresh_secret);

    let mut request = CsrfRequest::new(Method::POST)
        .with_cookies(cookies)
        .with_form_body([("csrf", fresh_token)]);
    let mut response = CsrfResponse::new();
    assert_eq!(
        csrf.chain(&mut request, &mut response),
        Ok(Outcome::CreatedAndVerified)
    );
}

#[test]
fn test_alternate_digests() {
    for digest in [Digest::Sha256, Digest::Sha384, Digest::Sha512] {
        let config = CsrfConfig::default()
            .with_cookie_secure(false)
            .with_digest(digest);
        let csrf = CsrfMiddleware::from_secret("csrfSecret", config).unwrap();

        let mut request = CsrfRequest::new(Method::GET);
        let mut response = CsrfResponse::new();
        csrf.create(&mut request, &mut response);

        let secret = response.cookie("csrf").unwrap().value().to_string();
        let token = request.csrf_token().unwrap();

        let request = CsrfRequest::new(Method::PUT)
            .with_cookies(HashMap::from([("csrf".to_string(), secret)]))
            .with_json_body(serde_json::json!({ "csrf": token }));
        assert_eq!(csrf.verify(&request), Ok(Outcome::Verified), "{}", digest);
    }
}

#[test]
fn test_middleware_is_shareable() {
    fn assert_send_sync<T: Send + Sync + Clone>() {}
    assert_send_sync::<CsrfMiddleware>();

    let csrf = csrf();
    let clone = csrf.clone();
    assert_eq!(clone.config(), csrf.config());
}
