//! CORS proxy server.
//!
//! ```text
//!  Browser                        cors-proxy                          Target
//!  ───────                        ──────────                          ──────
//!  GET /?target=api.example.com ─▶ http::server ─▶ proxy::engine
//!                                                   │ validate target
//!                                                   │ filter headers
//!                                                   └─ forwarder ───▶ GET https://api.example.com
//!                                                                        │
//!  200 + Access-Control-Allow-* ◀─ http::adapter ◀─ response pipeline ◀──┘
//! ```
//!
//! Configuration comes from an optional TOML file, with CLI flags and
//! environment variables layered on top.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use cors_proxy::config::{read_config, validate_config, ConfigError, ProxyConfig};
use cors_proxy::http::HttpServer;
use cors_proxy::lifecycle::{signals, Shutdown};
use cors_proxy::observability::logging;
use cors_proxy::proxy::HeaderPolicy;

#[derive(Debug, Parser)]
#[command(name = "cors-proxy", version)]
#[command(about = "HTTP proxy that adds CORS headers to any target's responses")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "CORS_PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, overriding `listener.bind_address`.
    #[arg(short, long, env = "CORS_PROXY_BIND")]
    bind: Option<String>,

    /// Outbound header policy (`minimal` or `host-rewrite`), overriding
    /// `forwarding.header_policy`.
    #[arg(long)]
    header_policy: Option<HeaderPolicy>,
}

fn build_config(args: &Args) -> Result<ProxyConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => ProxyConfig::default(),
    };

    if let Some(bind) = &args.bind {
        config.listener.bind_address = bind.clone();
    }
    if let Some(policy) = args.header_policy {
        config.forwarding.header_policy = policy;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = build_config(&args)?;

    logging::init(&config.observability)?;

    tracing::info!("cors-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        config_file = ?args.config,
        bind_address = %config.listener.bind_address,
        header_policy = ?config.forwarding.header_policy,
        max_redirects = config.forwarding.max_redirects,
        max_body_bytes = config.forwarding.max_body_bytes,
        "Configuration loaded"
    );

    // Bind TCP listener
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    signals::spawn_signal_handler(&shutdown);

    let server = HttpServer::new(config)?;
    server.run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
