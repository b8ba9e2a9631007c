//! Request-side data model.
//!
//! `ProxyRequest` is what a host adapter hands the engine; `OutboundRequest`
//! is what the engine hands the forwarder after validation and filtering.

use axum::http::{HeaderMap, Method};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;

use crate::proxy::error::ProxyError;
use crate::proxy::target::NormalizedTarget;

/// Name of the query parameter carrying the target URL.
pub const TARGET_PARAM: &str = "target";

/// An inbound request, independent of the host runtime that received it.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    /// Inbound method.
    pub method: Method,
    /// Raw `target` query value, if present.
    pub target: Option<String>,
    /// Inbound headers.
    pub headers: HeaderMap,
    /// Inbound body, if the host delivered one.
    pub body: Option<Bytes>,
    /// Whether `body` is base64 text that must be decoded first.
    pub body_is_base64: bool,
}

impl ProxyRequest {
    /// A request with no headers or body.
    pub fn new(method: Method, target: Option<String>) -> Self {
        Self {
            method,
            target,
            headers: HeaderMap::new(),
            body: None,
            body_is_base64: false,
        }
    }

    /// Extract the `target` parameter from a raw query string.
    pub fn target_from_query(query: Option<&str>) -> Option<String> {
        let query = query?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == TARGET_PARAM)
            .map(|(_, value)| value.into_owned())
    }

    /// Whether the inbound method is one the proxy handles.
    pub fn is_supported_method(&self) -> bool {
        matches!(
            self.method,
            Method::GET
                | Method::HEAD
                | Method::POST
                | Method::PUT
                | Method::PATCH
                | Method::DELETE
                | Method::OPTIONS
        )
    }

    /// The body to forward upstream, decoded and restricted to methods that carry one.
    pub fn outbound_body(&self) -> Result<Option<Bytes>, ProxyError> {
        if !carries_body(&self.method) {
            return Ok(None);
        }
        let body = match &self.body {
            Some(body) if !body.is_empty() => body,
            _ => return Ok(None),
        };
        if !self.body_is_base64 {
            return Ok(Some(body.clone()));
        }
        STANDARD
            .decode(body)
            .map(|decoded| Some(Bytes::from(decoded)))
            .map_err(|e| ProxyError::InvalidBody {
                details: e.to_string(),
            })
    }
}

fn carries_body(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// A validated request ready for the forwarder.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    /// Method to issue upstream.
    pub method: Method,
    /// Destination.
    pub target: NormalizedTarget,
    /// Filtered headers.
    pub headers: HeaderMap,
    /// Body to send, if any.
    pub body: Option<Bytes>,
}
