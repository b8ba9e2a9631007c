//! Inbound → upstream header filtering.
//!
//! # Responsibilities
//! - Decide which inbound headers travel to the upstream target
//! - Strip headers identifying the proxy's own hosting infrastructure
//! - Optionally rewrite `Host`/`Origin`/`Referer` to match the target
//!
//! # Policies
//! - [`HeaderPolicy::Minimal`]: only `Content-Type`, `Authorization` and
//!   `Accept` are forwarded; nothing is rewritten.
//! - [`HeaderPolicy::HostRewrite`]: every inbound header is forwarded except
//!   infrastructure and hop-by-hop headers, then `Host`, `Origin` and
//!   `Referer` are set from the target.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::proxy::target::NormalizedTarget;

/// Headers forwarded under every policy when the caller supplied them.
pub const FORWARDED_ALLOWLIST: &[&str] = &["content-type", "authorization", "accept"];

/// Headers added by hosting platforms, CDNs and this proxy itself.
/// They describe the caller's connection and never reach the target.
pub const INFRASTRUCTURE_HEADERS: &[&str] = &[
    // Cloudflare
    "cf-connecting-ip",
    "cf-ipcountry",
    "cf-ray",
    "cf-visitor",
    // Netlify
    "x-nf-client-connection-ip",
    "x-nf-request-id",
    "x-nf-geo",
    // Generic forwarding
    "x-forwarded-for",
    "x-forwarded-host",
    "x-forwarded-port",
    "x-forwarded-proto",
    "forwarded",
    "x-real-ip",
    "true-client-ip",
    "fastly-client-ip",
    "via",
    // Tracing
    "x-amzn-trace-id",
    REQUEST_ID,
];

/// Correlation header owned by the proxy's host binding.
pub const REQUEST_ID: &str = "x-request-id";

/// Hop-by-hop headers (RFC 7230 §6.1), never forwarded in either direction.
pub const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

/// Check if a header is a hop-by-hop header.
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP_HEADERS.contains(&name.as_str())
}

/// Check if a header identifies hosting infrastructure.
pub fn is_infrastructure(name: &HeaderName) -> bool {
    INFRASTRUCTURE_HEADERS.contains(&name.as_str())
}

/// How inbound headers are carried to the upstream target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeaderPolicy {
    /// Forward only the allow-listed headers.
    #[default]
    Minimal,
    /// Forward everything but infrastructure headers; make the request look
    /// same-origin to the target.
    HostRewrite,
}

impl std::str::FromStr for HeaderPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "minimal" => Ok(Self::Minimal),
            "host-rewrite" => Ok(Self::HostRewrite),
            other => Err(format!(
                "unknown header policy `{other}` (expected `minimal` or `host-rewrite`)"
            )),
        }
    }
}

impl HeaderPolicy {
    /// Build the outbound header set for `target` from the inbound headers.
    pub fn filter(&self, inbound: &HeaderMap, target: &NormalizedTarget) -> HeaderMap {
        match self {
            Self::Minimal => allowlisted(inbound),
            Self::HostRewrite => rewritten(inbound, target),
        }
    }
}

fn allowlisted(inbound: &HeaderMap) -> HeaderMap {
    let mut outbound = HeaderMap::new();
    for name in FORWARDED_ALLOWLIST {
        // Duplicates collapse to the last value received.
        if let Some(value) = inbound.get_all(*name).iter().last() {
            outbound.insert(HeaderName::from_static(*name), value.clone());
        }
    }
    outbound
}

fn rewritten(inbound: &HeaderMap, target: &NormalizedTarget) -> HeaderMap {
    let mut outbound = HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound {
        if is_hop_by_hop(name) || is_infrastructure(name) || name == header::CONTENT_LENGTH {
            continue;
        }
        // Values arrive in order, so the last duplicate wins.
        outbound.insert(name.clone(), value.clone());
    }

    set_from(&mut outbound, header::HOST, &target.host());
    set_from(&mut outbound, header::ORIGIN, &target.origin());
    set_from(&mut outbound, header::REFERER, target.href());
    outbound
}

fn set_from(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => {
            // The URL serializer only emits visible ASCII; drop rather than forward a stale value.
            headers.remove(name);
        }
    }
}
