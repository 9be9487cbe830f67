// ABOUTME: Centralized error handling for the relay's HTTP surface
// ABOUTME: Maps each taxonomy member to an HTTP status and a sanitized client message
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Error taxonomy for the listener's HTTP-facing operations.
#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// A second subscriber attempted to open an already-open target.
    #[error("target '{0}' already has an open connection")]
    AlreadyConnected(String),

    /// A POST referenced a target with no open subscription.
    #[error("target '{0}' is not connected")]
    UnknownTarget(String),

    /// The requested action is not in the active variant's allowed set.
    #[error("unknown action '{0}'")]
    UnknownAction(String),

    /// The payload failed the active variant's validation (e.g. invalid JSON).
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Internal failure not attributable to caller input.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::AlreadyConnected(_) => StatusCode::LOCKED,
            Self::UnknownTarget(_) | Self::UnknownAction(_) => StatusCode::NOT_FOUND,
            Self::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to an external caller.
    #[must_use]
    pub fn sanitized_message(&self) -> String {
        match self {
            Self::AlreadyConnected(_) => "Target is already connected".to_owned(),
            Self::UnknownTarget(_) => "Target is not connected".to_owned(),
            Self::UnknownAction(_) => "Unknown action requested".to_owned(),
            Self::MalformedPayload(detail) => detail.clone(),
            Self::Internal(_) => "Internal server error".to_owned(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "request failed");
        let status = self.status();
        let body = ErrorBody {
            message: self.sanitized_message(),
        };
        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
