//! HTTP server host binding.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID + trace layers)
//!     → adapter.rs (Axum request → ProxyRequest, body limit)
//!     → proxy engine
//!     → adapter.rs (ProxyResponse → streamed Axum response)
//!     → Send to client
//! ```

pub mod adapter;
pub mod request;
pub mod server;

pub use adapter::AxumAdapter;
pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::HttpServer;
