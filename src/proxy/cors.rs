//! Cross-origin policy applied to every response the proxy produces.
//!
//! # Design Decisions
//! - Built once from configuration, shared read-only behind an `Arc`
//! - Header values are validated at construction; applying never fails
//! - Applying overwrites same-named upstream headers

use axum::http::{header, HeaderMap, HeaderValue, Method};
use thiserror::Error;

use crate::config::CorsConfig;

/// Error building a [`CorsPolicy`] from configuration.
#[derive(Debug, Error)]
pub enum CorsPolicyError {
    /// A configured value is not a legal header value.
    #[error("invalid value for {field}: {value:?}")]
    InvalidValue {
        /// Configuration field name.
        field: &'static str,
        /// Offending value.
        value: String,
    },

    /// A configured method is not a valid HTTP method token.
    #[error("invalid method in allow_methods: {0:?}")]
    InvalidMethod(String),
}

/// Immutable CORS header set.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allow_origin: HeaderValue,
    allow_methods: HeaderValue,
    allow_headers: HeaderValue,
}

impl CorsPolicy {
    /// Build the policy from its configuration section.
    pub fn from_config(config: &CorsConfig) -> Result<Self, CorsPolicyError> {
        let methods = config
            .allow_methods
            .iter()
            .map(|m| {
                Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes())
                    .map_err(|_| CorsPolicyError::InvalidMethod(m.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let method_list = methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");

        Ok(Self {
            allow_origin: header_value("allow_origin", &config.allow_origin)?,
            allow_methods: header_value("allow_methods", &method_list)?,
            allow_headers: header_value("allow_headers", &config.allow_headers.join(", "))?,
        })
    }

    /// Overlay the policy onto `headers`, replacing any existing values.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            self.allow_origin.clone(),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            self.allow_methods.clone(),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            self.allow_headers.clone(),
        );
    }

    /// Comma-separated method list, as used in `Allow`.
    pub fn allow_methods(&self) -> &HeaderValue {
        &self.allow_methods
    }
}

fn header_value(field: &'static str, value: &str) -> Result<HeaderValue, CorsPolicyError> {
    HeaderValue::from_str(value).map_err(|_| CorsPolicyError::InvalidValue {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_headers() {
        let policy = CorsPolicy::from_config(&CorsConfig::default()).unwrap();
        let mut headers = HeaderMap::new();
        policy.apply(&mut headers);

        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_METHODS],
            "GET, HEAD, POST, PUT, DELETE, OPTIONS"
        );
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "Content-Type, Authorization, Accept"
        );
    }

    #[test]
    fn test_policy_overwrites_upstream_values() {
        let policy = CorsPolicy::from_config(&CorsConfig::default()).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("https://only-me.example"),
        );
        headers.append(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("https://and-me.example"),
        );
        policy.apply(&mut headers);

        let values: Vec<_> = headers
            .get_all(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .iter()
            .collect();
        assert_eq!(values, vec!["*"]);
    }

    #[test]
    fn test_methods_are_normalized() {
        let config = CorsConfig {
            allow_methods: vec!["get".into(), " Post ".into()],
            ..CorsConfig::default()
        };
        let policy = CorsPolicy::from_config(&config).unwrap();
        assert_eq!(policy.allow_methods(), "GET, POST");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = CorsConfig {
            allow_origin: "bad\nvalue".into(),
            ..CorsConfig::default()
        };
        assert!(matches!(
            CorsPolicy::from_config(&config),
            Err(CorsPolicyError::InvalidValue { field: "allow_origin", .. })
        ));

        let config = CorsConfig {
            allow_methods: vec!["GE T".into()],
            ..CorsConfig::default()
        };
        assert!(matches!(
            CorsPolicy::from_config(&config),
            Err(CorsPolicyError::InvalidMethod(_))
        ));
    }
}
