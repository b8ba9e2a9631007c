//! Host runtime seam.
//!
//! Each runtime that receives requests (an HTTP server, a serverless function
//! host) implements [`HostAdapter`] to translate between its native types and
//! the engine's [`ProxyRequest`]/[`ProxyResponse`].

use std::future::Future;

use crate::proxy::error::ProxyError;
use crate::proxy::request::ProxyRequest;
use crate::proxy::response::ProxyResponse;

/// What a host can carry in a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyTransport {
    /// Raw bytes, streamed.
    Binary,
    /// Text only; binary payloads travel base64-encoded with a flag.
    TextOnly,
}

/// Translation between a host runtime and the proxy engine.
pub trait HostAdapter: Send + Sync {
    /// The runtime's inbound request type.
    type Request: Send;
    /// The runtime's outbound response type.
    type Response;

    /// The body transport this host offers.
    fn transport(&self) -> BodyTransport;

    /// Convert a native request. Failures are rendered like any other proxy error.
    fn parse(
        &self,
        native: Self::Request,
    ) -> impl Future<Output = Result<ProxyRequest, ProxyError>> + Send;

    /// Convert a proxy response into the runtime's native response.
    fn render(&self, response: ProxyResponse) -> Self::Response;
}
