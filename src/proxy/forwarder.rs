//! Outbound HTTP calls to the target.
//!
//! # Responsibilities
//! - Issue exactly one request per inbound request (no retries)
//! - Follow redirects with the transport's policy
//! - Connect to targets directly; environment proxy settings are ignored
//! - Surface transport failures as [`ProxyError::UpstreamFailure`]
//! - Abort the in-flight call when the inbound request is cancelled
//!
//! The response body is not read here; it is handed back as a stream so the
//! response pipeline decides whether to pass it through or buffer it.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use axum::http::{header, HeaderMap, StatusCode};
use bytes::Bytes;
use futures_util::{Stream, StreamExt, TryStreamExt};
use tokio_util::sync::CancellationToken;

use crate::config::ForwardingConfig;
use crate::proxy::error::ProxyError;
use crate::proxy::request::OutboundRequest;

/// Boxed error carried by upstream body streams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A response body as a stream of chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, BoxError>> + Send>>;

/// An upstream response with its body not yet consumed.
pub struct UpstreamResponse {
    /// Status as returned by the target (after redirects).
    pub status: StatusCode,
    /// Headers as returned by the target.
    pub headers: HeaderMap,
    /// Body chunks.
    pub body: ByteStream,
}

impl std::fmt::Debug for UpstreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Something that can execute an [`OutboundRequest`].
pub trait Upstream: Send + Sync {
    /// Send the request and return the response head with a streaming body.
    fn send(
        &self,
        request: OutboundRequest,
    ) -> impl Future<Output = Result<UpstreamResponse, ProxyError>> + Send;
}

/// [`Upstream`] backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
}

impl Forwarder {
    /// Build a forwarder from the forwarding configuration.
    pub fn new(config: &ForwardingConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .no_proxy()
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects));
        if let Some(secs) = config.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl Upstream for Forwarder {
    async fn send(&self, request: OutboundRequest) -> Result<UpstreamResponse, ProxyError> {
        let OutboundRequest {
            method,
            target,
            mut headers,
            body,
        } = request;

        // The client derives `Host` from the URL, which also keeps it correct across redirects.
        headers.remove(header::HOST);

        let mut builder = self
            .client
            .request(method, target.url().clone())
            .headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| ProxyError::upstream(&e))?;

        tracing::debug!(
            target_url = %response.url(),
            status = %response.status(),
            "Upstream responded"
        );

        Ok(UpstreamResponse {
            status: response.status(),
            headers: response.headers().clone(),
            body: response
                .bytes_stream()
                .map_err(|e| Box::new(e) as BoxError)
                .boxed(),
        })
    }
}

/// Race `upstream.send` against cancellation of the inbound request.
///
/// Dropping the losing send future aborts the outbound connection.
pub async fn send_or_cancel<U: Upstream>(
    upstream: &U,
    request: OutboundRequest,
    cancel: &CancellationToken,
) -> Result<UpstreamResponse, ProxyError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ProxyError::UpstreamFailure {
            details: "inbound request was cancelled".to_string(),
        }),
        result = upstream.send(request) => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::target::NormalizedTarget;
    use axum::http::Method;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Never answers; records whether its future was dropped.
    struct Hanging {
        dropped: Arc<AtomicBool>,
    }

    struct SetOnDrop(Arc<AtomicBool>);

    impl Drop for SetOnDrop {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    impl Upstream for Hanging {
        async fn send(&self, _request: OutboundRequest) -> Result<UpstreamResponse, ProxyError> {
            let _guard = SetOnDrop(self.dropped.clone());
            std::future::pending().await
        }
    }

    fn request(target: &str) -> OutboundRequest {
        OutboundRequest {
            method: Method::GET,
            target: NormalizedTarget::parse(Some(target)).unwrap(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    #[tokio::test]
    async fn test_cancellation_aborts_send() {
        let dropped = Arc::new(AtomicBool::new(false));
        let upstream = Hanging {
            dropped: dropped.clone(),
        };
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = send_or_cancel(&upstream, request("example.com"), &cancel).await;
        assert!(matches!(result, Err(ProxyError::UpstreamFailure { .. })));
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_connection_refused_is_upstream_failure() {
        let forwarder = Forwarder::new(&ForwardingConfig::default()).unwrap();
        let err = forwarder
            .send(request("http://127.0.0.1:1/"))
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(!err.details().unwrap_or_default().is_empty());
    }
}
