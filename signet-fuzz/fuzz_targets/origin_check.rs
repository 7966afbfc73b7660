//! Fuzz target for origin/referrer checks.
//!
//! Arbitrary header values must never panic, and an origin whose host is
//! not the declared host must never pass.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use http::{HeaderMap, HeaderValue};
use signet_csrf::OriginChecker;
use signet_csrf::origin::origin_matches_host;

#[derive(Debug, Arbitrary)]
struct FuzzOrigin {
    origin: String,
    host: String,
    forwarded_host: Option<String>,
    configured_host: Option<String>,
}

fuzz_target!(|data: FuzzOrigin| {
    let _ = origin_matches_host(&data.origin, &data.host);

    let mut headers = HeaderMap::new();
    for (name, value) in [
        ("origin", Some(&data.origin)),
        ("host", Some(&data.host)),
        ("x-forwarded-host", data.forwarded_host.as_ref()),
    ] {
        if let Some(value) = value.and_then(|v| HeaderValue::from_str(v).ok()) {
            headers.insert(name, value);
        }
    }

    let checker = OriginChecker::new(data.configured_host.filter(|h| !h.trim().is_empty()));
    let _ = checker.check(&headers);

    // Appending a foreign label never keeps the origin on the declared host
    if !data.host.is_empty() && !data.host.contains(':') {
        let foreign = format!("https://{}.evil.invalid", data.host);
        assert!(!origin_matches_host(&foreign, &data.host));
    }
});
