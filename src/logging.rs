// ABOUTME: Structured logging setup shared by all three binaries
// ABOUTME: Configures log level, format and noise reduction for dependency crates
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use anyhow::Result;
use std::env;
use std::io;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone)]
pub enum LogFormat {
    /// JSON, one object per line.
    Json,
    /// Multi-line, human readable.
    Pretty,
    /// Single line, human readable.
    Compact,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub service_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
            service_name: "sse-relay".into(),
        }
    }
}

impl LoggingConfig {
    #[must_use]
    pub fn from_env(service_name: &str) -> Self {
        let level = env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
        let format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        };
        Self {
            level,
            format,
            service_name: service_name.to_owned(),
        }
    }

    /// Initialize the global tracing subscriber.
    ///
    /// # Errors
    ///
    /// Returns an error if a subscriber is already installed.
    pub fn init(&self) -> Result<()> {
        let env_filter = EnvFilter::try_new(&self.level)
            .unwrap_or_else(|_| EnvFilter::new("info"))
            .add_directive("hyper=warn".parse()?)
            .add_directive("reqwest=warn".parse()?)
            .add_directive("tower_http=info".parse()?);

        let registry = tracing_subscriber::registry().with(env_filter);

        match self.format {
            LogFormat::Json => {
                registry
                    .with(fmt::layer().with_target(true).with_writer(io::stdout).json())
                    .init();
            }
            LogFormat::Pretty => {
                registry
                    .with(fmt::layer().with_target(true).with_writer(io::stdout))
                    .init();
            }
            LogFormat::Compact => {
                registry
                    .with(
                        fmt::layer()
                            .compact()
                            .with_target(false)
                            .with_writer(io::stdout),
                    )
                    .init();
            }
        }

        info!(
            service.name = %self.service_name,
            log.level = %self.level,
            log.format = ?self.format,
            "starting up"
        );

        Ok(())
    }
}
