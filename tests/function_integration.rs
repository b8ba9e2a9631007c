//! Function host binding against a real upstream: text-only transport.

mod common;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;

use common::{png_bytes, start_mock_upstream};
use cors_proxy::function::{FunctionAdapter, FunctionEvent, FunctionResponse};
use cors_proxy::{ProxyConfig, ProxyEngine};

async fn invoke(event: Value) -> FunctionResponse {
    let config = ProxyConfig::default();
    let engine = ProxyEngine::from_config(&config).unwrap();
    let adapter = FunctionAdapter::new(config.forwarding.max_body_bytes);
    let event: FunctionEvent = serde_json::from_value(event).unwrap();
    engine.serve(&adapter, event, &CancellationToken::new()).await
}

#[tokio::test]
async fn test_binary_body_base64_round_trip() {
    let upstream = start_mock_upstream().await;

    let response = invoke(json!({
        "httpMethod": "GET",
        "queryStringParameters": {"target": format!("http://{upstream}/image.png")}
    }))
    .await;

    assert_eq!(response.status_code, 200);
    assert!(response.is_base64_encoded);
    assert_eq!(response.headers["content-type"], "image/png");
    assert_eq!(response.headers["access-control-allow-origin"], "*");
    assert!(!response.headers.contains_key("content-length"));

    let decoded = STANDARD.decode(&response.body).unwrap();
    assert_eq!(Sha256::digest(decoded), Sha256::digest(png_bytes()));
}

#[tokio::test]
async fn test_json_body_is_base64_too() {
    let upstream = start_mock_upstream().await;

    let response = invoke(json!({
        "httpMethod": "GET",
        "queryStringParameters": {"target": format!("http://{upstream}/data")}
    }))
    .await;

    assert_eq!(response.status_code, 200);
    assert!(response.is_base64_encoded);
    assert_eq!(response.body, "eyJhIjoxfQ==");
}

#[tokio::test]
async fn test_base64_request_body_decoded_before_forwarding() {
    let upstream = start_mock_upstream().await;

    let response = invoke(json!({
        "httpMethod": "POST",
        "headers": {"content-type": "text/plain"},
        "queryStringParameters": {"target": format!("http://{upstream}/echo")},
        "body": STANDARD.encode("hello upstream"),
        "isBase64Encoded": true
    }))
    .await;

    assert_eq!(response.status_code, 200);
    let echo: Value = serde_json::from_slice(&STANDARD.decode(&response.body).unwrap()).unwrap();
    assert_eq!(echo["body"], "hello upstream");
    assert_eq!(echo["headers"]["content-type"], "text/plain");
}

#[tokio::test]
async fn test_missing_target_is_plain_json() {
    let response = invoke(json!({
        "httpMethod": "GET",
        "queryStringParameters": null
    }))
    .await;

    assert_eq!(response.status_code, 400);
    assert!(!response.is_base64_encoded);
    assert_eq!(response.headers["access-control-allow-origin"], "*");
    let body: Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["error"], "Target URL is required. Use `/?target=YOUR_URL`.");
}

#[tokio::test]
async fn test_preflight() {
    let response = invoke(json!({
        "httpMethod": "OPTIONS",
        "headers": {
            "origin": "https://app.example",
            "access-control-request-method": "PUT",
            "access-control-request-headers": "authorization"
        }
    }))
    .await;

    assert_eq!(response.status_code, 204);
    assert_eq!(response.body, "");
    assert_eq!(
        response.headers["access-control-allow-methods"],
        "GET, HEAD, POST, PUT, DELETE, OPTIONS"
    );
}
