//! Axum host binding for the proxy engine.
//!
//! # Responsibilities
//! - Pull the `target` query parameter, method, headers and body out of an
//!   Axum request
//! - Enforce the inbound body size limit
//! - Turn a [`ProxyResponse`] into an Axum response, streaming upstream bodies
//!
//! # Design Decisions
//! - Binary transport: bytes pass through untouched, never base64
//! - The body is read with a running size check instead of trusting
//!   `Content-Length`

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use bytes::BytesMut;
use futures_util::StreamExt;

use crate::proxy::{BodyTransport, HostAdapter, ProxyBody, ProxyError, ProxyRequest, ProxyResponse};

/// [`HostAdapter`] for requests received by the Axum server.
#[derive(Debug, Clone, Copy)]
pub struct AxumAdapter {
    max_body_bytes: usize,
}

impl AxumAdapter {
    /// Create an adapter accepting bodies up to `max_body_bytes`.
    pub fn new(max_body_bytes: usize) -> Self {
        Self { max_body_bytes }
    }

    async fn read_body(&self, body: Body) -> Result<Option<bytes::Bytes>, ProxyError> {
        let mut stream = body.into_data_stream();
        let mut buf = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ProxyError::InvalidBody {
                details: e.to_string(),
            })?;
            if buf.len() + chunk.len() > self.max_body_bytes {
                return Err(ProxyError::BodyTooLarge {
                    limit: self.max_body_bytes,
                });
            }
            buf.extend_from_slice(&chunk);
        }
        Ok((!buf.is_empty()).then(|| buf.freeze()))
    }
}

impl HostAdapter for AxumAdapter {
    type Request = Request<Body>;
    type Response = Response;

    fn transport(&self) -> BodyTransport {
        BodyTransport::Binary
    }

    async fn parse(&self, native: Request<Body>) -> Result<ProxyRequest, ProxyError> {
        let (parts, body) = native.into_parts();

        let declared = parts
            .headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());
        if declared.is_some_and(|len| len > self.max_body_bytes) {
            return Err(ProxyError::BodyTooLarge {
                limit: self.max_body_bytes,
            });
        }

        let mut request = ProxyRequest::new(
            parts.method,
            ProxyRequest::target_from_query(parts.uri.query()),
        );
        request.headers = parts.headers;
        request.body = self.read_body(body).await?;
        Ok(request)
    }

    fn render(&self, response: ProxyResponse) -> Response {
        let body = match response.body {
            ProxyBody::Empty => Body::empty(),
            ProxyBody::Text(text) | ProxyBody::Base64(text) => Body::from(text),
            ProxyBody::Stream(stream) => Body::from_stream(stream),
        };

        let mut out = Response::new(body);
        *out.status_mut() = response.status;
        *out.headers_mut() = response.headers;
        out
    }
}
