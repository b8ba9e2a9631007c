//! CORS proxy library.
//!
//! Forwards `/?target=<url>` requests to the named target and relays the
//! response with CORS headers attached, so browser code can reach hosts that
//! do not serve CORS themselves.
//!
//! The host-independent core lives in [`proxy`]; [`http`] and [`function`]
//! bind it to an Axum server and to a serverless function host respectively.

// Core
pub mod proxy;

// Host bindings
pub mod function;
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use proxy::ProxyEngine;
