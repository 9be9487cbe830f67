// ABOUTME: Per-connection dispatch loop draining one target's buffer into SSE frames
// ABOUTME: Interprets the reserved retry/close actions; everything else is emitted verbatim
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::event::{Event as RelayEvent, Variant, ACTION_CLOSE, ACTION_RETRY};
use crate::registry::{EventReceiver, Registry};
use async_stream::stream;
use axum::response::sse::Event as SseEvent;
use chrono::Utc;
use futures_util::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::time::interval;

/// Build the SSE byte stream for one open subscription.
///
/// Consumes `receiver` until the channel closes or a `close` action is
/// dispatched, unregistering `target` from `registry` on the way out
/// regardless of which path ended the loop.
pub fn dispatch_stream(
    registry: Registry,
    target: String,
    variant: Variant,
    mut receiver: EventReceiver,
    keepalive: Duration,
) -> impl Stream<Item = Result<SseEvent, Infallible>> {
    stream! {
        let mut retry_override: Option<i64> = None;
        let mut ticker = (!keepalive.is_zero()).then(|| interval(keepalive));

        loop {
            let tick = async {
                match ticker.as_mut() {
                    Some(t) => { t.tick().await; }
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                biased;

                maybe_event = receiver.recv() => {
                    let Some(event) = maybe_event else {
                        break;
                    };

                    if event.action == ACTION_RETRY {
                        match event.payload.trim().parse::<i64>() {
                            Ok(ms) => retry_override = Some(ms),
                            Err(_) => tracing::warn!(
                                target = %target,
                                payload = %event.payload,
                                "ignoring non-numeric retry directive",
                            ),
                        }
                        continue;
                    }

                    if event.action == ACTION_CLOSE {
                        break;
                    }

                    yield Ok(build_frame(variant, &event, retry_override.take()));
                }

                () = tick => {
                    yield Ok(SseEvent::default().comment(format!("keepalive {}", Utc::now().timestamp())));
                }
            }
        }

        registry.close(&target).await;
    }
}

fn build_frame(variant: Variant, event: &RelayEvent, retry_override: Option<i64>) -> SseEvent {
    // Field order matters: axum's builder appends in call order, and §4.3
    // requires id, then retry, then event, then data on the wire.
    let mut frame = SseEvent::default();

    if let Some(id) = event.id {
        frame = frame.id(id.to_string());
    }
    if let Some(ms) = retry_override {
        if let Ok(ms) = u64::try_from(ms) {
            frame = frame.retry(Duration::from_millis(ms));
        }
    }

    frame = frame.event(event.action.clone());

    let lines = variant
        .format_data_lines(&event.payload)
        .unwrap_or_else(|_| vec![event.payload.clone()]);
    frame.data(lines.join("\n"))
}
