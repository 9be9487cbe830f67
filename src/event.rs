// ABOUTME: Event variants and the payload/id policy each one enforces
// ABOUTME: Collapses the four event flavours into one enum, no inheritance
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::errors::AppError;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Reserved action that opens a subscription.
pub const ACTION_POLL: &str = "poll";
/// Reserved action that terminates a subscription.
pub const ACTION_CLOSE: &str = "close";
/// Reserved action that sets the client-side retry timeout.
pub const ACTION_RETRY: &str = "retry";
/// Default action ferried through on a plain event.
pub const ACTION_PING: &str = "ping";

/// Which payload encoding and id policy a listener enforces for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variant {
    /// Multi-line text payload, no generated id.
    String,
    /// JSON payload, re-encoded canonically, no generated id.
    Json,
    /// Multi-line text payload, with a generated monotonic id.
    StringId,
    /// JSON payload, re-encoded canonically, with a generated monotonic id.
    JsonId,
}

impl Variant {
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::String | Self::StringId => "text/plain",
            Self::Json | Self::JsonId => "application/json",
        }
    }

    #[must_use]
    pub const fn generates_id(self) -> bool {
        matches!(self, Self::StringId | Self::JsonId)
    }

    #[must_use]
    pub fn allowed_actions(self) -> &'static [&'static str] {
        if self.generates_id() {
            &[ACTION_PING, ACTION_RETRY, ACTION_CLOSE]
        } else {
            &[ACTION_PING, ACTION_CLOSE]
        }
    }

    #[must_use]
    pub fn allows_action(self, action: &str) -> bool {
        self.allowed_actions().contains(&action)
    }

    /// Split a raw payload into the data lines that will become `data:` frames.
    ///
    /// # Errors
    ///
    /// Returns `AppError::MalformedPayload` if a JSON variant's payload does not parse.
    pub fn format_data_lines(self, raw: &str) -> Result<Vec<String>, AppError> {
        match self {
            Self::String | Self::StringId => {
                Ok(raw.split('\n').map(ToOwned::to_owned).collect())
            }
            Self::Json | Self::JsonId => {
                let value: serde_json::Value = serde_json::from_str(raw)
                    .map_err(|e| AppError::MalformedPayload(format!("invalid JSON: {e}")))?;
                let canonical = serde_json::to_string(&value)
                    .map_err(|e| AppError::MalformedPayload(format!("re-encode failed: {e}")))?;
                Ok(vec![canonical])
            }
        }
    }
}

impl std::str::FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(Self::String),
            "json" => Ok(Self::Json),
            "string-id" => Ok(Self::StringId),
            "json-id" => Ok(Self::JsonId),
            other => Err(format!("unknown variant '{other}'")),
        }
    }
}

/// Process-wide monotonic id counter shared by every id-generating variant.
///
/// An `AtomicU64` rather than a plain field: the server runs on a
/// multi-threaded executor, unlike the single-threaded original this
/// counter descends from.
#[derive(Debug, Default)]
pub struct IdGenerator(AtomicU64);

impl IdGenerator {
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

/// One unit dispatched to a target's buffer.
#[derive(Debug, Clone)]
pub struct Event {
    pub target: String,
    pub action: String,
    pub payload: String,
    pub id: Option<u64>,
}

impl Event {
    #[must_use]
    pub fn new(
        variant: Variant,
        ids: &IdGenerator,
        target: impl Into<String>,
        action: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        let id = variant.generates_id().then(|| ids.next());
        Self {
            target: target.into(),
            action: action.into(),
            payload: payload.into(),
            id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_variant_splits_lines() {
        let lines = Variant::String.format_data_lines("a\nb\nc").expect("format");
        assert_eq!(lines, vec!["a", "b", "c"]);
    }

    #[test]
    fn json_variant_rejects_invalid_json() {
        assert!(Variant::Json.format_data_lines("not json").is_err());
    }

    #[test]
    fn json_variant_canonicalizes() {
        let lines = Variant::Json.format_data_lines(r#"{"b":1,"a":2}"#).expect("format");
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn id_generator_is_monotonic() {
        let gen = IdGenerator::new();
        assert_eq!(gen.next(), 0);
        assert_eq!(gen.next(), 1);
        assert_eq!(gen.next(), 2);
    }

    #[test]
    fn allowed_actions_depend_on_id_policy() {
        assert!(!Variant::String.allows_action(ACTION_RETRY));
        assert!(Variant::StringId.allows_action(ACTION_RETRY));
    }
}
