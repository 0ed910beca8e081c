//! Request gateway command-line client.
//!
//! Issues one JSON request against the configured backend. If the backend is
//! unreachable the request is parked and the terminal shows a single retry
//! prompt; pressing Enter replays it.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;

use request_gateway::config::{load_config, validation::validate_config, ConfigError, GatewayConfig};
use request_gateway::gateway::{ChannelNotifier, Gateway, GatewayResult, Method, OutageEvent, NO_BODY};
use request_gateway::observability;

#[derive(Parser)]
#[command(name = "request-gateway")]
#[command(about = "Resilient JSON client for the game backend", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured base URL.
    #[arg(short, long)]
    url: Option<String>,

    /// Bearer token to send with the request.
    #[arg(short, long)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// GET a path and print the JSON response
    Get { path: String },
    /// POST a JSON body to a path
    Post {
        path: String,
        #[arg(short, long)]
        body: Option<String>,
    },
    /// PUT a JSON body to a path
    Put {
        path: String,
        #[arg(short, long)]
        body: Option<String>,
    },
    /// DELETE a path
    Delete { path: String },
    /// Probe the backend health endpoint
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(url) = cli.url {
        config.endpoint.base_url = url;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    observability::logging::init(&config.observability)?;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let (notifier, events) = ChannelNotifier::new();
    let gateway = Gateway::from_config(&config, Arc::new(notifier))?;
    if let Some(token) = cli.token {
        gateway.session().login(token);
    }

    let prompt = tokio::spawn(retry_prompt(gateway.clone(), events));

    let result = match cli.command {
        Commands::Get { path } => gateway.get::<Value>(&path).await.map(Some),
        Commands::Post { path, body } => send_with_body(&gateway, &path, Method::Post, body).await,
        Commands::Put { path, body } => send_with_body(&gateway, &path, Method::Put, body).await,
        Commands::Delete { path } => gateway.delete(&path).await.map(|_| None),
        Commands::Health => {
            let healthy = gateway.check_health().await?;
            println!("{}", if healthy { "healthy" } else { "unhealthy" });
            prompt.abort();
            if !healthy {
                std::process::exit(1);
            }
            return Ok(());
        }
    };

    prompt.abort();

    match result {
        Ok(Some(json)) => println!("{}", serde_json::to_string_pretty(&json)?),
        Ok(None) => println!("OK"),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn send_with_body(
    gateway: &Gateway,
    path: &str,
    method: Method,
    body: Option<String>,
) -> GatewayResult<Option<Value>> {
    let request = match body {
        Some(raw) => {
            let json: Value = serde_json::from_str(&raw)
                .map_err(|e| request_gateway::GatewayError::Encoding(format!("--body: {}", e)))?;
            gateway.build_request(path, method, Some(&json))?
        }
        None => gateway.build_request(path, method, NO_BODY)?,
    };
    gateway.execute::<Value>(&request).await.map(Some)
}

/// Render outage notices and turn Enter presses into a gateway retry.
async fn retry_prompt(gateway: Gateway, mut events: UnboundedReceiver<OutageEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(event) = events.recv().await {
        match event {
            OutageEvent::Shown(reason) => {
                eprintln!("Connection problem: {}", reason);
                eprintln!("Press Enter to retry...");

                match lines.next_line().await {
                    Ok(Some(_)) => {}
                    Ok(None) | Err(_) => {
                        tracing::warn!(reason = %reason, "stdin closed, no way to confirm a retry");
                        eprintln!("Error: {} (stdin closed, cannot retry)", reason);
                        std::process::exit(1);
                    }
                }

                match gateway.check_health().await {
                    Ok(true) => eprintln!("Backend is reachable again, retrying."),
                    _ => eprintln!("Backend still looks unreachable, retrying anyway."),
                }
                gateway.retry_outage();
            }
            OutageEvent::Dismissed => {}
        }
    }
}
