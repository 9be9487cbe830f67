// ABOUTME: HTTP router wiring the poster, subscriber and health endpoints together
// ABOUTME: Builds the per-connection SSE stream and the target's dispatch task on every GET
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use crate::dispatch::dispatch_stream;
use crate::errors::{AppError, AppResult};
use crate::event::{Event, IdGenerator, Variant, ACTION_POLL};
use crate::registry::Registry;
use axum::{
    extract::{Path, State},
    response::sse::Sse,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

/// Shared state every handler is given through `axum::extract::State`.
#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
    pub ids: Arc<IdGenerator>,
    pub variant: Variant,
    pub keepalive: Duration,
}

impl AppState {
    #[must_use]
    pub fn new(variant: Variant, keepalive: Duration) -> Self {
        Self {
            registry: Registry::new(),
            ids: Arc::new(IdGenerator::new()),
            variant,
            keepalive,
        }
    }
}

#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/:action/:target", get(subscribe).post(publish))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    connected: usize,
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    axum::Json(Health {
        status: "ok",
        connected: state.registry.connected_count().await,
    })
}

async fn subscribe(
    Path((action, target)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    if action != ACTION_POLL {
        return Ok(Redirect::permanent("/").into_response());
    }

    let receiver = state.registry.open(&target).await?;
    let stream = dispatch_stream(
        state.registry.clone(),
        target,
        state.variant,
        receiver,
        state.keepalive,
    );

    let mut response = Sse::new(stream).into_response();
    response
        .headers_mut()
        .insert(axum::http::header::CACHE_CONTROL, "no-cache".parse().expect("static header value"));
    Ok(response)
}

async fn publish(
    Path((action, target)): Path<(String, String)>,
    State(state): State<AppState>,
    body: String,
) -> AppResult<impl IntoResponse> {
    if !state.variant.allows_action(&action) {
        return Err(AppError::UnknownAction(action));
    }
    if !state.registry.is_connected(&target).await {
        return Err(AppError::UnknownTarget(target));
    }

    // retry/close carry no variant-specific payload semantics; only
    // ping-class actions are validated and canonicalized here, so a
    // JSON variant never spuriously rejects a bare integer retry value.
    if action != crate::event::ACTION_RETRY && action != crate::event::ACTION_CLOSE {
        state.variant.format_data_lines(&body)?;
    }

    let event = Event::new(state.variant, &state.ids, target, action, body);
    state.registry.enqueue(event).await?;
    Ok(([(axum::http::header::ACCEPT, state.variant.content_type())], ()))
}
