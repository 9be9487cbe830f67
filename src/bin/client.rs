// ABOUTME: Client binary: connects to a listener's subscribe endpoint and prints received events
// ABOUTME: CLI surface mirrors the original eventsource client's host/port/action/retry/auth flags
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use sse_relay::client::{poll, ClientConfig};
use sse_relay::logging::LoggingConfig;
use tokio::sync::watch;
use tracing::info;

#[derive(Parser)]
#[command(name = "sse-client")]
#[command(about = "Server-Sent Events client: subscribe to a target and print received events")]
struct Args {
    /// Host to connect to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port to connect to
    #[arg(short = 'P', long)]
    port: Option<u16>,

    /// Enable HTTPS scheme support
    #[arg(short = 'S', long)]
    ssl: bool,

    /// Reconnection delay in milliseconds
    #[arg(short = 'r', long, default_value_t = 0)]
    retry: i64,

    /// Keep trying to reconnect on disconnection
    #[arg(short = 'k', long)]
    keep_alive: bool,

    /// The listening action to connect to
    #[arg(short = 'a', long, default_value = "poll")]
    action: String,

    /// URL path prefix, e.g. "sse" for http://host:port/sse/poll/<token>
    #[arg(short = 'x', long)]
    prefix: Option<String>,

    /// Username for basic authentication
    #[arg(short = 'u', long)]
    user: Option<String>,

    /// Password for basic authentication
    #[arg(short = 'p', long)]
    password: Option<String>,

    /// Enable debug logging
    #[arg(short = 'd', long)]
    debug: bool,

    /// Token to subscribe to
    token: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut logging = LoggingConfig::from_env("sse-client");
    if args.debug {
        logging.level = "debug".into();
    }
    logging.init()?;

    let scheme = if args.ssl { "https" } else { "http" };
    let port = args.port.unwrap_or(if args.ssl { 443 } else { 80 });
    let url = match &args.prefix {
        Some(prefix) => format!(
            "{scheme}://{}:{port}/{prefix}/{}/{}",
            args.host, args.action, args.token
        ),
        None => format!("{scheme}://{}:{port}/{}/{}", args.host, args.action, args.token),
    };

    info!(url = %url, "connecting");

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        let _ = stop_tx.send(true);
    });

    let config = ClientConfig {
        url,
        keep_alive: args.keep_alive,
        initial_retry_ms: args.retry,
        user: args.user,
        password: args.password,
    };

    poll(
        config,
        |event| {
            println!(
                "event: {}\nid: {}\ndata: {}\n",
                event.name,
                event.id.as_deref().unwrap_or(""),
                event.data.as_deref().unwrap_or(""),
            );
        },
        stop_rx,
    )
    .await
}
