// ABOUTME: Listener binary: accepts subscriber streams and publisher posts for one process
// ABOUTME: CLI surface mirrors the original eventsource-server's host/port/keepalive/variant flags
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use sse_relay::config::ListenerConfig;
use sse_relay::event::Variant;
use sse_relay::logging::LoggingConfig;
use sse_relay::routes::{router, AppState};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "sse-listener")]
#[command(about = "Server-Sent Events listener: subscribe and publish endpoints for target tokens")]
struct Args {
    /// Host to bind to
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port to bind to
    #[arg(short = 'P', long)]
    port: Option<u16>,

    /// TLS certificate file (requires --keyfile)
    #[arg(short = 'C', long = "certfile")]
    certfile: Option<String>,

    /// TLS key file (requires --certfile)
    #[arg(short = 'K', long = "keyfile")]
    keyfile: Option<String>,

    /// Event variant: string, json, string-id, json-id
    #[arg(long)]
    variant: Option<String>,

    /// Keepalive interval in seconds (0 disables)
    #[arg(long)]
    keepalive_seconds: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args_or_default();
    let config = setup_configuration(&args)?;
    run(config).await
}

fn parse_args_or_default() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Argument parsing failed: {e}");
            eprintln!("Using default configuration");
            Args {
                host: None,
                port: None,
                certfile: None,
                keyfile: None,
                variant: None,
                keepalive_seconds: None,
            }
        }
    }
}

fn setup_configuration(args: &Args) -> Result<ListenerConfig> {
    let mut config = ListenerConfig::from_env()?;

    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(variant) = &args.variant {
        config.variant = variant.parse().map_err(|e| anyhow::anyhow!(e))?;
    }
    if let Some(seconds) = args.keepalive_seconds {
        config.keepalive = Duration::from_secs(seconds);
    }
    if args.certfile.is_some() || args.keyfile.is_some() {
        config.cert_path = args.certfile.clone();
        config.key_path = args.keyfile.clone();
    }
    config.validate()?;

    LoggingConfig::from_env("sse-listener").init()?;
    info!("Starting SSE listener");
    info!("{}", config.summary());

    Ok(config)
}

async fn run(config: ListenerConfig) -> Result<()> {
    let variant: Variant = config.variant;
    let app = router(AppState::new(variant, config.keepalive));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
