//! Request handling pipeline.
//!
//! ```text
//! ProxyRequest
//!     → OPTIONS?  preflight (terminates)
//!     → target validation
//!     → header filter
//!     → forwarder (cancellable)
//!     → response pipeline (headers + CORS overlay + body)
//! ProxyResponse
//! ```
//!
//! Any [`ProxyError`] raised along the way short-circuits to the error
//! translator, so the engine always produces a response.

use std::sync::Arc;

use axum::http::Method;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::ProxyConfig;
use crate::proxy::adapter::{BodyTransport, HostAdapter};
use crate::proxy::cors::{CorsPolicy, CorsPolicyError};
use crate::proxy::error::ProxyError;
use crate::proxy::forwarder::{send_or_cancel, Forwarder, Upstream};
use crate::proxy::headers::HeaderPolicy;
use crate::proxy::preflight;
use crate::proxy::request::{OutboundRequest, ProxyRequest};
use crate::proxy::response::{relay, ProxyResponse};
use crate::proxy::target::NormalizedTarget;

/// Failure assembling an engine from configuration.
#[derive(Debug, Error)]
pub enum EngineError {
    /// CORS section could not be turned into header values.
    #[error("invalid CORS policy: {0}")]
    Cors(#[from] CorsPolicyError),

    /// The upstream HTTP client could not be built.
    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Stateless request handler shared by every host binding.
#[derive(Debug, Clone)]
pub struct ProxyEngine<U = Forwarder> {
    cors: Arc<CorsPolicy>,
    header_policy: HeaderPolicy,
    upstream: U,
}

impl ProxyEngine<Forwarder> {
    /// Build an engine forwarding with a real HTTP client.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, EngineError> {
        let cors = Arc::new(CorsPolicy::from_config(&config.cors)?);
        let forwarder = Forwarder::new(&config.forwarding)?;
        Ok(Self::new(cors, config.forwarding.header_policy, forwarder))
    }
}

impl<U: Upstream> ProxyEngine<U> {
    /// Assemble an engine from its parts.
    pub fn new(cors: Arc<CorsPolicy>, header_policy: HeaderPolicy, upstream: U) -> Self {
        Self {
            cors,
            header_policy,
            upstream,
        }
    }

    /// The CORS policy applied to every response.
    pub fn cors(&self) -> &CorsPolicy {
        &self.cors
    }

    /// Run a native request through `adapter` and the pipeline.
    pub async fn serve<A: HostAdapter>(
        &self,
        adapter: &A,
        native: A::Request,
        cancel: &CancellationToken,
    ) -> A::Response {
        let response = match adapter.parse(native).await {
            Ok(request) => self.handle(request, adapter.transport(), cancel).await,
            Err(err) => self.reject(err),
        };
        adapter.render(response)
    }

    /// Handle one request. Never fails: errors become JSON responses.
    pub async fn handle(
        &self,
        request: ProxyRequest,
        transport: BodyTransport,
        cancel: &CancellationToken,
    ) -> ProxyResponse {
        match self.try_handle(request, transport, cancel).await {
            Ok(response) => response,
            Err(err) => self.reject(err),
        }
    }

    /// Translate an error into its response, logging it on the way.
    pub fn reject(&self, err: ProxyError) -> ProxyResponse {
        if err.is_server_error() {
            tracing::error!(error = %err, details = ?err.details(), "Proxy request failed");
        } else {
            tracing::warn!(error = %err, status = %err.status_code(), "Proxy request rejected");
        }
        err.into_response(&self.cors)
    }

    async fn try_handle(
        &self,
        request: ProxyRequest,
        transport: BodyTransport,
        cancel: &CancellationToken,
    ) -> Result<ProxyResponse, ProxyError> {
        if !request.is_supported_method() {
            return Err(ProxyError::MethodNotAllowed(request.method));
        }

        if request.method == Method::OPTIONS {
            tracing::debug!(
                preflight = preflight::is_cors_preflight(&request.headers),
                "Answering OPTIONS locally"
            );
            return Ok(preflight::respond(&request.headers, &self.cors));
        }

        let target = NormalizedTarget::parse(request.target.as_deref()).map_err(|err| {
            if let ProxyError::InvalidTarget { input, reason } = &err {
                tracing::debug!(input = %input, reason = %reason, "Target rejected");
            }
            err
        })?;
        let body = request.outbound_body()?;
        let headers = self.header_policy.filter(&request.headers, &target);

        tracing::debug!(
            method = %request.method,
            target = %target,
            header_policy = ?self.header_policy,
            body_len = body.as_ref().map_or(0, |b| b.len()),
            "Forwarding request"
        );

        let outbound = OutboundRequest {
            method: request.method,
            target,
            headers,
            body,
        };

        let upstream = send_or_cancel(&self.upstream, outbound, cancel).await?;
        relay(upstream, &self.cors, transport).await
    }
}
