//! Serverless function entrypoint.
//!
//! Reads one invocation event (JSON) from stdin, runs it through the proxy
//! engine and writes the function response (JSON) to stdout. Logs go to stderr.

use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use cors_proxy::config::{read_config, validate_config, ConfigError, ProxyConfig};
use cors_proxy::function::{FunctionAdapter, FunctionEvent};
use cors_proxy::observability::logging;
use cors_proxy::proxy::{HeaderPolicy, ProxyEngine};

#[derive(Debug, Parser)]
#[command(name = "proxy-function", version)]
#[command(about = "Handle one CORS proxy invocation: event on stdin, response on stdout")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "CORS_PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Outbound header policy (`minimal` or `host-rewrite`).
    #[arg(long)]
    header_policy: Option<HeaderPolicy>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(policy) = args.header_policy {
        config.forwarding.header_policy = policy;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init(&config.observability)?;

    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    let event: FunctionEvent = serde_json::from_str(&input)?;

    tracing::debug!(method = %event.http_method, "Invocation received");

    let engine = ProxyEngine::from_config(&config)?;
    let adapter = FunctionAdapter::new(config.forwarding.max_body_bytes);
    let response = engine
        .serve(&adapter, event, &CancellationToken::new())
        .await;

    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}
