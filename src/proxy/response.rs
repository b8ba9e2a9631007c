//! Response pipeline: upstream response → proxied response.
//!
//! # Responsibilities
//! - Copy upstream headers, minus hop-by-hop headers and the upstream's
//!   `x-request-id` (the host binding owns that one)
//! - Overlay the CORS policy (policy values always win)
//! - Mirror the upstream status unmodified
//! - Carry the body byte-exact, streamed or base64-wrapped per host transport
//!
//! # Design Decisions
//! - The encoding choice depends only on [`BodyTransport`], never on the
//!   body's content type or content

use axum::http::{header, HeaderMap, StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures_util::TryStreamExt;

use crate::proxy::adapter::BodyTransport;
use crate::proxy::cors::CorsPolicy;
use crate::proxy::error::ProxyError;
use crate::proxy::forwarder::{ByteStream, UpstreamResponse};
use crate::proxy::headers::{is_hop_by_hop, REQUEST_ID};

/// Body of a response produced by the proxy.
pub enum ProxyBody {
    /// No body.
    Empty,
    /// A body generated by the proxy itself (error JSON).
    Text(String),
    /// Upstream bytes, passed through as they arrive.
    Stream(ByteStream),
    /// Upstream bytes, base64-encoded for a text-only transport.
    Base64(String),
}

impl ProxyBody {
    /// Whether the caller must base64-decode the body before delivery.
    pub fn is_base64_encoded(&self) -> bool {
        matches!(self, Self::Base64(_))
    }
}

impl std::fmt::Debug for ProxyBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
            Self::Base64(encoded) => f.debug_tuple("Base64").field(&encoded.len()).finish(),
        }
    }
}

/// A response ready for a host adapter to render.
#[derive(Debug)]
pub struct ProxyResponse {
    /// Status code.
    pub status: StatusCode,
    /// Headers, CORS policy included.
    pub headers: HeaderMap,
    /// Body.
    pub body: ProxyBody,
}

/// Translate an upstream response for delivery over `transport`.
///
/// For [`BodyTransport::TextOnly`] this reads the whole upstream body, so it
/// can fail with [`ProxyError::UpstreamFailure`].
pub async fn relay(
    upstream: UpstreamResponse,
    cors: &CorsPolicy,
    transport: BodyTransport,
) -> Result<ProxyResponse, ProxyError> {
    let UpstreamResponse {
        status,
        headers: upstream_headers,
        body,
    } = upstream;

    let mut headers = HeaderMap::with_capacity(upstream_headers.len() + 3);
    for (name, value) in &upstream_headers {
        if !is_hop_by_hop(name) && name.as_str() != REQUEST_ID {
            headers.append(name.clone(), value.clone());
        }
    }

    let body = match transport {
        BodyTransport::Binary => ProxyBody::Stream(body),
        BodyTransport::TextOnly => {
            let bytes = collect(body).await?;
            // The encoded payload has a different length than upstream announced.
            headers.remove(header::CONTENT_LENGTH);
            ProxyBody::Base64(STANDARD.encode(bytes))
        }
    };

    cors.apply(&mut headers);

    Ok(ProxyResponse {
        status,
        headers,
        body,
    })
}

async fn collect(body: ByteStream) -> Result<Vec<u8>, ProxyError> {
    body.try_fold(Vec::new(), |mut acc, chunk| async move {
        acc.extend_from_slice(&chunk);
        Ok(acc)
    })
    .await
    .map_err(|e| ProxyError::upstream(&*e))
}
