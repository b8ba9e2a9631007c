//! Function event and response shapes, and the adapter between them and the engine.

use std::collections::{BTreeMap, HashMap};

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};

use crate::proxy::{
    BodyTransport, HostAdapter, ProxyBody, ProxyError, ProxyRequest, ProxyResponse, TARGET_PARAM,
};

/// Inbound invocation event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FunctionEvent {
    /// Request method.
    #[serde(deserialize_with = "deserialize_method")]
    pub http_method: Method,

    /// Request headers, names lowercased by the host. `null` reads as empty.
    #[serde(deserialize_with = "deserialize_nullable_map")]
    pub headers: HashMap<String, String>,

    /// Decoded query parameters. Hosts send `null` when there are none.
    #[serde(deserialize_with = "deserialize_nullable_map")]
    pub query_string_parameters: HashMap<String, String>,

    /// Request body as text.
    pub body: Option<String>,

    /// Whether `body` is base64 text.
    pub is_base64_encoded: bool,
}

/// Outbound invocation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResponse {
    /// Response status.
    pub status_code: u16,

    /// Response headers; repeated headers are joined with `", "`.
    pub headers: BTreeMap<String, String>,

    /// Response body, base64 when `is_base64_encoded` is set.
    pub body: String,

    /// Whether the host must decode `body` before delivery.
    pub is_base64_encoded: bool,
}

fn deserialize_method<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Method, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Method::from_bytes(raw.trim().to_ascii_uppercase().as_bytes()).map_err(serde::de::Error::custom)
}

fn deserialize_nullable_map<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<HashMap<String, String>, D::Error> {
    Ok(Option::<HashMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// [`HostAdapter`] for function invocations.
#[derive(Debug, Clone, Copy)]
pub struct FunctionAdapter {
    max_body_bytes: usize,
}

impl FunctionAdapter {
    /// Create an adapter accepting bodies up to `max_body_bytes` (as sent, before decoding).
    pub fn new(max_body_bytes: usize) -> Self {
        Self { max_body_bytes }
    }
}

impl HostAdapter for FunctionAdapter {
    type Request = FunctionEvent;
    type Response = FunctionResponse;

    fn transport(&self) -> BodyTransport {
        BodyTransport::TextOnly
    }

    async fn parse(&self, event: FunctionEvent) -> Result<ProxyRequest, ProxyError> {
        let FunctionEvent {
            http_method,
            headers,
            mut query_string_parameters,
            body,
            is_base64_encoded,
        } = event;

        if body.as_ref().is_some_and(|b| b.len() > self.max_body_bytes) {
            return Err(ProxyError::BodyTooLarge {
                limit: self.max_body_bytes,
            });
        }

        let mut request =
            ProxyRequest::new(http_method, query_string_parameters.remove(TARGET_PARAM));
        request.headers = to_header_map(headers);
        request.body = body.map(Bytes::from);
        request.body_is_base64 = is_base64_encoded;
        Ok(request)
    }

    fn render(&self, response: ProxyResponse) -> FunctionResponse {
        let ProxyResponse {
            mut status,
            headers,
            body,
        } = response;

        let is_base64_encoded = body.is_base64_encoded();
        let body = match body {
            ProxyBody::Empty => String::new(),
            ProxyBody::Text(text) | ProxyBody::Base64(text) => text,
            ProxyBody::Stream(_) => {
                tracing::error!("Streamed body reached a text-only host");
                status = StatusCode::INTERNAL_SERVER_ERROR;
                String::new()
            }
        };

        FunctionResponse {
            status_code: status.as_u16(),
            headers: from_header_map(&headers),
            body,
            is_base64_encoded,
        }
    }
}

fn to_header_map(headers: HashMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                map.append(name, value);
            }
            _ => tracing::debug!(header = %name, "Skipping malformed event header"),
        }
    }
    map
}

fn from_header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for name in headers.keys() {
        let values: Vec<&str> = headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if !values.is_empty() {
            out.insert(name.as_str().to_string(), values.join(", "));
        }
    }
    out
}
