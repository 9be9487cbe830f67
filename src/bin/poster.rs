// ABOUTME: Poster binary: sends a single event to a listener's target over HTTP
// ABOUTME: CLI surface mirrors the original request utility's token/action/data/host/port flags
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use sse_relay::logging::LoggingConfig;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "sse-poster")]
#[command(about = "Send a single event to a listener's target")]
struct Args {
    /// Token to be used for connection
    token: String,

    /// Action to send
    action: String,

    /// Data to be sent
    #[arg(default_value = "")]
    data: String,

    /// Host to connect to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port to connect to
    #[arg(short = 'P', long, default_value_t = 8888)]
    port: u16,

    /// Treat data as JSON (re-encoded canonically before sending)
    #[arg(short = 'j', long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    LoggingConfig::from_env("sse-poster").init()?;

    let payload = if args.json {
        let value: serde_json::Value = match serde_json::from_str(&args.data) {
            Ok(v) => v,
            Err(e) => {
                error!(error = %e, "data is not valid JSON");
                return Ok(ExitCode::FAILURE);
            }
        };
        serde_json::to_string(&value)?
    } else {
        args.data.clone()
    };

    let url = format!(
        "http://{}:{}/{}/{}",
        args.host, args.port, args.action, args.token
    );
    info!(url = %url, "posting");

    let client = reqwest::Client::new();
    let response = client.post(&url).body(payload).send().await?;

    if response.status().is_success() {
        let body = response.text().await.unwrap_or_default();
        println!("{body}");
        Ok(ExitCode::SUCCESS)
    } else {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        eprintln!("Unable to send request: {status} {body}");
        Ok(ExitCode::FAILURE)
    }
}
