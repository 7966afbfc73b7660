//! Origin/referrer consistency check.
//!
//! A defense-in-depth layer in front of token verification: browsers attach
//! `Origin` (or at least `Referer`) to cross-site form posts, so a declared
//! origin naming another host is rejected outright.

use crate::error::{CsrfError, Result};
use http::HeaderMap;
use url::Url;

const X_REQUESTED_WITH: &str = "x-requested-with";
const X_FORWARDED_HOST: &str = "x-forwarded-host";

/// Checks a request's declared origin against the serving host.
#[derive(Debug, Clone, Default)]
pub struct OriginChecker {
    host: Option<String>,
}

impl OriginChecker {
    /// `host` overrides the `X-Forwarded-Host`/`Host` request headers.
    pub fn new(host: Option<String>) -> Self {
        Self { host }
    }

    pub fn check(&self, headers: &HeaderMap) -> Result<()> {
        if is_xml_http_request(headers) {
            return Ok(());
        }

        let Some(origin) = declared_origin(headers) else {
            return Ok(());
        };

        let matches = self
            .declared_host(headers)
            .is_some_and(|host| origin_matches_host(origin, host));

        if matches {
            Ok(())
        } else {
            tracing::warn!(origin, "Rejecting request from foreign origin");
            Err(CsrfError::BadOrigin)
        }
    }

    /// Configured host, else `X-Forwarded-Host` (first entry), else `Host`.
    pub fn declared_host<'h>(&'h self, headers: &'h HeaderMap) -> Option<&'h str> {
        if let Some(host) = self.host.as_deref() {
            return Some(host);
        }

        header_str(headers, X_FORWARDED_HOST)
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .or_else(|| header_str(headers, http::header::HOST.as_str()))
    }
}

/// `Origin`, else `Referer`/`Referrer`; empty values count as absent.
pub fn declared_origin(headers: &HeaderMap) -> Option<&str> {
    ["origin", "referer", "referrer"]
        .into_iter()
        .filter_map(|name| header_str(headers, name))
        .find(|v| !v.is_empty())
}

/// Same-origin script marker (`X-Requested-With: XMLHttpRequest`).
pub fn is_xml_http_request(headers: &HeaderMap) -> bool {
    header_str(headers, X_REQUESTED_WITH) == Some("XMLHttpRequest")
}

/// Whether a declared origin URL points at `host`.
///
/// The origin's scheme is stripped by parsing it as an absolute URL; its
/// hostname must equal the host's hostname. When `host` carries a port, the
/// origin's explicit or default port must match too.
pub fn origin_matches_host(origin: &str, host: &str) -> bool {
    let Ok(url) = Url::parse(origin) else {
        return false;
    };
    let Some(origin_host) = url.host_str() else {
        return false;
    };
    let Some((hostname, port)) = split_host(host) else {
        return false;
    };

    if !origin_host.eq_ignore_ascii_case(hostname) {
        return false;
    }

    match port {
        Some(port) => url.port_or_known_default() == Some(port),
        None => true,
    }
}

/// Split `host[:port]`, keeping brackets around IPv6 literals.
pub(crate) fn split_host(host: &str) -> Option<(&str, Option<u16>)> {
    let host = host.trim();

    let (hostname, port) = if host.starts_with('[') {
        let end = host.find(']')?;
        let (hostname, rest) = host.split_at(end + 1);
        match rest.strip_prefix(':') {
            Some(port) => (hostname, Some(port)),
            None if rest.is_empty() => (hostname, None),
            None => return None,
        }
    } else {
        match host.rsplit_once(':') {
            Some((hostname, port)) => (hostname, Some(port)),
            None => (host, None),
        }
    };

    if hostname.is_empty() {
        return None;
    }

    let port = match port {
        Some(port) => Some(port.parse::<u16>().ok()?),
        None => None,
    };

    Some((hostname, port))
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
