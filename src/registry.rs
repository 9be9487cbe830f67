// ABOUTME: Subscription registry mapping target tokens to their open buffer
// ABOUTME: Keyed directly by target so is_connected is an O(1) lookup, not a value scan
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::errors::AppError;
use crate::event::Event;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

/// Unbounded per-target FIFO; the dispatch task owns the receiver exclusively.
pub type EventSender = mpsc::UnboundedSender<Event>;
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

/// The single shared piece of mutable state in the listener.
#[derive(Clone, Default)]
pub struct Registry {
    subscriptions: Arc<RwLock<HashMap<String, EventSender>>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a subscription for `target`, returning the receiving half of its buffer.
    ///
    /// # Errors
    ///
    /// Returns `AppError::AlreadyConnected` if `target` already has an open subscription.
    pub async fn open(&self, target: &str) -> Result<EventReceiver, AppError> {
        let mut subs = self.subscriptions.write().await;
        if subs.contains_key(target) {
            return Err(AppError::AlreadyConnected(target.to_owned()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        subs.insert(target.to_owned(), tx);
        tracing::info!(target = target, "subscription opened");
        Ok(rx)
    }

    /// Remove `target`'s subscription, if any. Idempotent.
    pub async fn close(&self, target: &str) {
        let mut subs = self.subscriptions.write().await;
        if subs.remove(target).is_some() {
            tracing::info!(target = target, "subscription closed");
        }
    }

    pub async fn is_connected(&self, target: &str) -> bool {
        self.subscriptions.read().await.contains_key(target)
    }

    /// Enqueue `event` onto its target's buffer.
    ///
    /// # Errors
    ///
    /// Returns `AppError::UnknownTarget` if the target has no open subscription.
    pub async fn enqueue(&self, event: Event) -> Result<(), AppError> {
        let subs = self.subscriptions.read().await;
        let sender = subs
            .get(&event.target)
            .ok_or_else(|| AppError::UnknownTarget(event.target.clone()))?;
        sender
            .send(event)
            .map_err(|e| AppError::UnknownTarget(e.0.target))
    }

    pub async fn connected_count(&self) -> usize {
        self.subscriptions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{IdGenerator, Variant};

    #[tokio::test]
    async fn open_twice_is_rejected() {
        let registry = Registry::new();
        let _rx = registry.open("t1").await.expect("first open");
        let err = registry.open("t1").await.expect_err("second open");
        assert!(matches!(err, AppError::AlreadyConnected(_)));
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let registry = Registry::new();
        let _rx = registry.open("t1").await.expect("open");
        registry.close("t1").await;
        registry.close("t1").await;
        assert!(!registry.is_connected("t1").await);
    }

    #[tokio::test]
    async fn enqueue_to_unknown_target_fails() {
        let registry = Registry::new();
        let ids = IdGenerator::new();
        let event = Event::new(Variant::String, &ids, "missing", "ping", "hi");
        let err = registry.enqueue(event).await.expect_err("enqueue");
        assert!(matches!(err, AppError::UnknownTarget(_)));
    }

    #[tokio::test]
    async fn enqueue_preserves_fifo_order() {
        let registry = Registry::new();
        let ids = IdGenerator::new();
        let mut rx = registry.open("t1").await.expect("open");
        for i in 0..3 {
            let event = Event::new(Variant::String, &ids, "t1", "ping", i.to_string());
            registry.enqueue(event).await.expect("enqueue");
        }
        for i in 0..3 {
            let event = rx.recv().await.expect("recv");
            assert_eq!(event.payload, i.to_string());
        }
    }
}
