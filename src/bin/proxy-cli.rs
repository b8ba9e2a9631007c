use std::process::ExitCode;

use clap::Parser;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "proxy-cli")]
#[command(about = "Fetch a URL through a running CORS proxy", long_about = None)]
struct Cli {
    /// Base URL of the proxy.
    #[arg(short, long, default_value = "http://localhost:8080", env = "CORS_PROXY_URL")]
    url: String,

    /// Show response status and headers.
    #[arg(short = 'i', long)]
    include: bool,

    /// Target to fetch; the scheme may be omitted.
    target: String,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut endpoint = reqwest::Url::parse(&cli.url)?;
    endpoint.query_pairs_mut().append_pair("target", &cli.target);

    let res = reqwest::Client::new().get(endpoint).send().await?;
    print_response(res, cli.include).await
}

async fn print_response(
    res: reqwest::Response,
    include: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let status = res.status();
    if include {
        println!("{status}");
        for (name, value) in res.headers() {
            println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
        }
        println!();
    }

    let text = res.text().await?;
    let json = serde_json::from_str::<Value>(&text).ok();

    if !status.is_success() {
        eprintln!("Error: proxy returned status {status}");
        match &json {
            Some(body) if body.get("error").is_some() => {
                eprintln!("  {}", body["error"].as_str().unwrap_or_default());
                if let Some(details) = body.get("details").and_then(Value::as_str) {
                    eprintln!("  details: {details}");
                }
            }
            _ => eprintln!("Response: {text}"),
        }
        return Ok(ExitCode::FAILURE);
    }

    match json {
        Some(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        None => println!("{text}"),
    }
    Ok(ExitCode::SUCCESS)
}
