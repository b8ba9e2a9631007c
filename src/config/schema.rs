//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::proxy::headers::HeaderPolicy;

/// Root configuration for the CORS proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// CORS headers stamped on every response.
    pub cors: CorsConfig,

    /// Outbound request behavior.
    pub forwarding: ForwardingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// CORS policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Value of `Access-Control-Allow-Origin`.
    pub allow_origin: String,

    /// Methods listed in `Access-Control-Allow-Methods` and `Allow`.
    pub allow_methods: Vec<String>,

    /// Headers listed in `Access-Control-Allow-Headers`.
    pub allow_headers: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origin: "*".to_string(),
            allow_methods: ["GET", "HEAD", "POST", "PUT", "DELETE", "OPTIONS"]
                .into_iter()
                .map(String::from)
                .collect(),
            allow_headers: ["Content-Type", "Authorization", "Accept"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Outbound request configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Which inbound headers reach the target.
    pub header_policy: HeaderPolicy,

    /// Redirect hops followed before giving up.
    pub max_redirects: usize,

    /// Largest inbound body accepted, in bytes.
    pub max_body_bytes: usize,

    /// Connection establishment timeout in seconds. Unset means no limit.
    pub connect_timeout_secs: Option<u64>,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            header_policy: HeaderPolicy::default(),
            max_redirects: 10,
            max_body_bytes: 10 * 1024 * 1024, // 10MB
            connect_timeout_secs: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: ProxyConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.cors.allow_origin, "*");
        assert_eq!(config.forwarding.header_policy, HeaderPolicy::Minimal);
        assert_eq!(config.forwarding.max_redirects, 10);
        assert_eq!(config.forwarding.connect_timeout_secs, None);
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_partial_sections() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [cors]
            allow_origin = "https://app.example"

            [forwarding]
            header_policy = "host-rewrite"
            connect_timeout_secs = 3

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.cors.allow_origin, "https://app.example");
        assert_eq!(config.cors.allow_methods.len(), 6);
        assert_eq!(config.forwarding.header_policy, HeaderPolicy::HostRewrite);
        assert_eq!(config.forwarding.connect_timeout_secs, Some(3));
        assert_eq!(config.forwarding.max_body_bytes, 10 * 1024 * 1024);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_unknown_header_policy_rejected() {
        let result: Result<ProxyConfig, _> = toml::from_str(
            r#"
            [forwarding]
            header_policy = "everything"
            "#,
        );
        assert!(result.is_err());
    }
}
