//! CORS proxy core, independent of the host runtime.
//!
//! # Data Flow
//! ```text
//! host request
//!     → adapter.rs (host-native → ProxyRequest)
//!     → engine.rs
//!         OPTIONS → preflight.rs (answered locally)
//!         other   → target.rs (validate + normalize)
//!                 → headers.rs (outbound header policy)
//!                 → forwarder.rs (one upstream call, cancellable)
//!                 → response.rs (copy headers, CORS overlay, body)
//!         failure → error.rs (JSON body + CORS)
//!     → adapter.rs (ProxyResponse → host-native)
//! ```
//!
//! # Design Decisions
//! - Every response, success or failure, carries the CORS policy
//! - Nothing is shared between requests except the policy and the client pool
//! - Host differences are isolated behind [`HostAdapter`] and [`BodyTransport`]

pub mod adapter;
pub mod cors;
pub mod engine;
pub mod error;
pub mod forwarder;
pub mod headers;
pub mod preflight;
pub mod request;
pub mod response;
pub mod target;

pub use adapter::{BodyTransport, HostAdapter};
pub use cors::{CorsPolicy, CorsPolicyError};
pub use engine::{EngineError, ProxyEngine};
pub use error::ProxyError;
pub use forwarder::{send_or_cancel, Forwarder, Upstream, UpstreamResponse};
pub use headers::HeaderPolicy;
pub use request::{OutboundRequest, ProxyRequest, TARGET_PARAM};
pub use response::{ProxyBody, ProxyResponse};
pub use target::NormalizedTarget;
