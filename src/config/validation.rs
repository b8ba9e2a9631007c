//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, addresses parse)
//! - Check that CORS values are legal header values and the method list
//!   covers preflight
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue, Method};
use thiserror::Error;

use crate::config::schema::ProxyConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("`{}` is not a socket address", config.listener.bind_address),
        ));
    }

    let cors = &config.cors;
    if cors.allow_origin.trim().is_empty() {
        errors.push(ValidationError::new("cors.allow_origin", "must not be empty"));
    } else if HeaderValue::from_str(&cors.allow_origin).is_err() {
        errors.push(ValidationError::new(
            "cors.allow_origin",
            "is not a valid header value",
        ));
    }

    if cors.allow_methods.is_empty() {
        errors.push(ValidationError::new("cors.allow_methods", "must not be empty"));
    }
    for method in &cors.allow_methods {
        if Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "cors.allow_methods",
                format!("`{method}` is not an HTTP method"),
            ));
        }
    }
    if !cors.allow_methods.is_empty()
        && !cors
            .allow_methods
            .iter()
            .any(|m| m.trim().eq_ignore_ascii_case("OPTIONS"))
    {
        errors.push(ValidationError::new(
            "cors.allow_methods",
            "must include OPTIONS",
        ));
    }

    for name in &cors.allow_headers {
        if HeaderName::from_bytes(name.trim().as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "cors.allow_headers",
                format!("`{name}` is not a header name"),
            ));
        }
    }

    let forwarding = &config.forwarding;
    if forwarding.max_body_bytes == 0 {
        errors.push(ValidationError::new(
            "forwarding.max_body_bytes",
            "must be greater than 0",
        ));
    }
    if forwarding.connect_timeout_secs == Some(0) {
        errors.push(ValidationError::new(
            "forwarding.connect_timeout_secs",
            "must be greater than 0 when set",
        ));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!(
                "`{}` is not one of {}",
                config.observability.log_level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
