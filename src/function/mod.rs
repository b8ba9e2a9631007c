//! Serverless function host binding.
//!
//! The function host hands over one JSON event per invocation and expects one
//! JSON response back. Response bodies must be text, so upstream bodies always
//! travel base64-encoded with `isBase64Encoded: true`.
//!
//! # Data Flow
//! ```text
//! FunctionEvent (JSON)
//!     → FunctionAdapter::parse (method, headers, queryStringParameters, body)
//!     → proxy engine (TextOnly transport)
//!     → FunctionAdapter::render
//! FunctionResponse (JSON)
//! ```

pub mod event;

pub use event::{FunctionAdapter, FunctionEvent, FunctionResponse};
