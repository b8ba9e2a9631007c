//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::{
    body::Bytes,
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{any, get},
    Json, Router,
};
use cors_proxy::{HttpServer, ProxyConfig, Shutdown};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Deterministic binary payload covering every byte value.
pub fn png_bytes() -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
    bytes.extend((0..8192u32).map(|i| (i.wrapping_mul(31) % 256) as u8));
    bytes
}

/// Start a mock upstream with fixed routes on an ephemeral port.
///
/// - `GET /data` → `{"a":1}`, with its own `Access-Control-Allow-Origin`
/// - `GET /image.png` → [`png_bytes`]
/// - `GET /redirect` → 303 to `/data`
/// - `GET /teapot` → 418
/// - `GET /request-id` → 200 carrying the upstream's own `x-request-id`
/// - `ANY /echo` → JSON describing the request as received
pub async fn start_mock_upstream() -> SocketAddr {
    let app = Router::new()
        .route("/data", get(data))
        .route("/image.png", get(image))
        .route("/redirect", get(|| async { Redirect::to("/data") }))
        .route("/teapot", get(|| async { (StatusCode::IM_A_TEAPOT, "short and stout") }))
        .route(
            "/request-id",
            get(|| async { ([("x-request-id", "upstream-id")], "ok") }),
        )
        .route("/echo", any(echo));

    spawn_router(app).await
}

/// Lifecycle events of a [`start_hanging_upstream`] handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerEvent {
    Started,
    Dropped,
}

struct DropSignal(mpsc::UnboundedSender<HandlerEvent>);

impl Drop for DropSignal {
    fn drop(&mut self) {
        let _ = self.0.send(HandlerEvent::Dropped);
    }
}

/// Start an upstream whose handler never responds.
///
/// The receiver reports when a handler starts and when its future is dropped.
pub async fn start_hanging_upstream() -> (SocketAddr, mpsc::UnboundedReceiver<HandlerEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let app = Router::new().fallback(move || {
        let tx = tx.clone();
        async move {
            let _signal = DropSignal(tx.clone());
            let _ = tx.send(HandlerEvent::Started);
            std::future::pending::<&'static str>().await
        }
    });

    (spawn_router(app).await, rx)
}

async fn data() -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "https://upstream.example"),
        ],
        r#"{"a":1}"#,
    )
        .into_response()
}

async fn image() -> Response {
    (
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"pixel.png\""),
        ],
        png_bytes(),
    )
        .into_response()
}

async fn echo(method: Method, headers: HeaderMap, body: Bytes) -> Json<serde_json::Value> {
    let headers: BTreeMap<String, String> = headers
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
        .collect();
    Json(json!({
        "method": method.as_str(),
        "headers": headers,
        "body": String::from_utf8_lossy(&body),
    }))
}

async fn spawn_router(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// A proxy server running on an ephemeral port.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TestProxy {
    /// `/?target=<target>` on this proxy, with the target percent-encoded.
    pub fn url(&self, target: &str) -> reqwest::Url {
        let mut url = reqwest::Url::parse(&format!("http://{}/", self.addr)).unwrap();
        url.query_pairs_mut().append_pair("target", target);
        url
    }

    /// The proxy root, without a target.
    pub fn root(&self) -> String {
        format!("http://{}/", self.addr)
    }
}

/// Start the proxy with `config`, listening on an ephemeral port.
pub async fn start_proxy(mut config: ProxyConfig) -> TestProxy {
    config.listener.bind_address = "127.0.0.1:0".to_string();
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    let server = HttpServer::new(config).unwrap();
    let handle = tokio::spawn(server.run(listener, receiver));

    TestProxy {
        addr,
        shutdown,
        handle,
    }
}

/// HTTP client that bypasses environment proxies and does not follow redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
