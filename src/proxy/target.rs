//! Target URL validation and normalization.
//!
//! # Responsibilities
//! - Turn the raw `target` query value into an absolute http(s) URL
//! - Default to `https://` when the caller omitted the scheme
//! - Reject anything that does not survive parsing
//!
//! # Design Decisions
//! - `NormalizedTarget` can only be obtained through [`NormalizedTarget::parse`]
//! - Scheme detection is case-insensitive (`HTTPS://` is accepted as-is)
//! - An explicit foreign scheme (`ftp://`, `ht!tp://`) is rejected instead of
//!   being prefixed, since prefixing would turn it into a different host

use std::fmt;

use url::Url;

use crate::proxy::error::ProxyError;

const DEFAULT_SCHEME_PREFIX: &str = "https://";

/// An absolute `http`/`https` URL the proxy may forward to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTarget {
    url: Url,
}

impl NormalizedTarget {
    /// Validate and normalize a raw `target` parameter.
    pub fn parse(raw: Option<&str>) -> Result<Self, ProxyError> {
        let raw = raw.map(str::trim).unwrap_or_default();
        if raw.is_empty() {
            return Err(ProxyError::MissingTarget);
        }

        let candidate = if has_http_scheme(raw) {
            raw.to_string()
        } else if let Some(scheme) = explicit_scheme(raw) {
            return Err(ProxyError::invalid_target(
                raw,
                format!("unsupported scheme `{scheme}`"),
            ));
        } else {
            format!("{DEFAULT_SCHEME_PREFIX}{raw}")
        };

        let url = Url::parse(&candidate)
            .map_err(|e| ProxyError::invalid_target(raw, e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ProxyError::invalid_target(raw, "scheme must be http or https"));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(ProxyError::invalid_target(raw, "missing host"));
        }

        Ok(Self { url })
    }

    /// The parsed URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Host with an explicit port when one is present, as sent in `Host`.
    pub fn host(&self) -> String {
        let host = self.url.host_str().unwrap_or_default();
        match self.url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }

    /// `scheme://host[:port]`, as sent in `Origin`.
    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    /// The full serialized URL, as sent in `Referer`.
    pub fn href(&self) -> &str {
        self.url.as_str()
    }
}

impl fmt::Display for NormalizedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

fn has_http_scheme(raw: &str) -> bool {
    starts_with_ignore_case(raw, "http://") || starts_with_ignore_case(raw, "https://")
}

fn starts_with_ignore_case(raw: &str, prefix: &str) -> bool {
    raw.len() >= prefix.len()
        && raw.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Returns the scheme portion when the input looks like `<scheme>://...`.
fn explicit_scheme(raw: &str) -> Option<&str> {
    let idx = raw.find("://")?;
    let head = &raw[..idx];
    // `host/path?next=http://x` carries `://` but no scheme of its own.
    if head.is_empty() || head.contains(['/', '?', '#']) {
        return None;
    }
    Some(head)
}
