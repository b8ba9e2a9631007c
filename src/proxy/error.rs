//! Proxy error taxonomy and translation to HTTP responses.
//!
//! Every failure in the pipeline is represented by a [`ProxyError`], created at
//! the point of detection and rendered into a JSON response carrying the CORS
//! policy. Nothing here propagates past the engine.

use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use serde::Serialize;
use thiserror::Error;

use crate::proxy::cors::CorsPolicy;
use crate::proxy::response::{ProxyBody, ProxyResponse};

/// Failures that terminate request handling.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The `target` query parameter was absent or empty.
    #[error("Target URL is required. Use `/?target=YOUR_URL`.")]
    MissingTarget,

    /// The `target` value could not be turned into an http(s) URL.
    #[error("Invalid target URL provided.")]
    InvalidTarget {
        /// The raw value as received.
        input: String,
        /// Why parsing rejected it.
        reason: String,
    },

    /// The outbound call could not complete.
    #[error("Proxy failed to fetch the target URL.")]
    UpstreamFailure {
        /// Transport error text, including its source chain.
        details: String,
    },

    /// The inbound method is outside the supported set.
    #[error("Method {0} is not supported by the proxy.")]
    MethodNotAllowed(Method),

    /// The inbound body could not be decoded.
    #[error("Request body could not be decoded.")]
    InvalidBody {
        /// Decoder error text.
        details: String,
    },

    /// The inbound body exceeded the configured limit.
    #[error("Request body exceeds the {limit} byte limit.")]
    BodyTooLarge {
        /// Configured limit in bytes.
        limit: usize,
    },
}

impl ProxyError {
    pub(crate) fn invalid_target(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    /// Build an upstream failure from a transport error and its source chain.
    pub fn upstream(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut details = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            let text = cause.to_string();
            if !details.ends_with(&text) {
                details.push_str(": ");
                details.push_str(&text);
            }
            source = cause.source();
        }
        Self::UpstreamFailure { details }
    }

    /// The HTTP status this error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingTarget | Self::InvalidTarget { .. } | Self::InvalidBody { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::UpstreamFailure { .. } => StatusCode::BAD_GATEWAY,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    /// Cause text exposed to the caller, if any.
    pub fn details(&self) -> Option<&str> {
        match self {
            Self::UpstreamFailure { details } | Self::InvalidBody { details } => Some(details),
            _ => None,
        }
    }

    /// Returns true if this error should be logged at error level.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::UpstreamFailure { .. })
    }

    /// Render this error as a JSON response carrying the CORS policy.
    pub fn into_response(self, cors: &CorsPolicy) -> ProxyResponse {
        let payload = ErrorBody {
            error: self.to_string(),
            details: self.details(),
        };
        // Serializing two strings cannot fail; fall back to the bare message anyway.
        let body = serde_json::to_string(&payload)
            .unwrap_or_else(|_| format!("{{\"error\":{:?}}}", payload.error));

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        cors.apply(&mut headers);

        ProxyResponse {
            status: self.status_code(),
            headers,
            body: ProxyBody::Text(body),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
}
