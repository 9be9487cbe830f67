// ABOUTME: Environment-driven configuration for the listener binary
// ABOUTME: Mirrors the from_env/validate/summary shape used across the ambient config layer
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::event::Variant;
use anyhow::{bail, Result};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub host: String,
    pub port: u16,
    pub variant: Variant,
    pub keepalive: Duration,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            variant: Variant::StringId,
            keepalive: Duration::from_secs(15),
            cert_path: None,
            key_path: None,
        }
    }
}

impl ListenerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a set variable holds a value of the wrong shape
    /// (unparsable port/keepalive, unknown variant name, or a cert/key pair
    /// where only one half is present).
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let host = env_var_or("SSE_HOST", &defaults.host);
        let port = match env::var("SSE_PORT") {
            Ok(v) => v
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid SSE_PORT '{v}': {e}"))?,
            Err(_) => defaults.port,
        };
        let variant = match env::var("SSE_VARIANT") {
            Ok(v) => v.parse().map_err(|e| anyhow::anyhow!(e))?,
            Err(_) => defaults.variant,
        };
        let keepalive = match env::var("SSE_KEEPALIVE_SECONDS") {
            Ok(v) => Duration::from_secs(
                v.parse()
                    .map_err(|e| anyhow::anyhow!("invalid SSE_KEEPALIVE_SECONDS '{v}': {e}"))?,
            ),
            Err(_) => defaults.keepalive,
        };
        let cert_path = env::var("SSE_TLS_CERT").ok();
        let key_path = env::var("SSE_TLS_KEY").ok();

        let config = Self {
            host,
            port,
            variant,
            keepalive,
            cert_path,
            key_path,
        };
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error if exactly one of `cert_path`/`key_path` is set.
    pub fn validate(&self) -> Result<()> {
        if self.cert_path.is_some() != self.key_path.is_some() {
            bail!("SSE_TLS_CERT and SSE_TLS_KEY must both be set or both be absent");
        }
        Ok(())
    }

    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "SSE Listener Configuration:\n\
             - Bind: {}:{}\n\
             - Variant: {:?}\n\
             - Keepalive: {:?}\n\
             - TLS: {}",
            self.host,
            self.port,
            self.variant,
            self.keepalive,
            if self.cert_path.is_some() {
                "enabled"
            } else {
                "disabled"
            },
        )
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}
