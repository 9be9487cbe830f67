// ABOUTME: Client-side reconnect policy: terminal vs retryable completion outcomes
// ABOUTME: Keeps retry_timeout in milliseconds end-to-end, only converting at the sleep call
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use reqwest::StatusCode;
use std::time::Duration;
use tokio::time::sleep;

/// How the previous attempt ended, as classified by `classify_response`/`classify_error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Reconnect per the current `retry_timeout`.
    Reconnect,
    /// Stop; the caller should not attempt another connection.
    Stop,
}

/// Statuses that always mean "reconnect", regardless of `keep_alive`.
///
/// Deliberately preserved from the original: a clean 200 completion is
/// folded into the same bucket as 5xx retryable failures. Documented,
/// not fixed, per design guidance.
const ALWAYS_RECONNECT: &[StatusCode] = &[
    StatusCode::OK,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

#[must_use]
pub fn classify_status(status: StatusCode) -> Outcome {
    if ALWAYS_RECONNECT.contains(&status) {
        Outcome::Reconnect
    } else {
        Outcome::Stop
    }
}

/// A transport error or a clean close with no response at all: reconnect
/// only if the caller configured `keep_alive`.
#[must_use]
pub const fn classify_disconnect(keep_alive: bool) -> Outcome {
    if keep_alive {
        Outcome::Reconnect
    } else {
        Outcome::Stop
    }
}

/// Reconnect loop driver. `retry_timeout_ms`:
/// - `-1` means stop (the caller's next poll should not re-attempt).
/// - `0` means reconnect immediately.
/// - `>0` means sleep this many milliseconds first.
///
/// The original divided this value by 1000 at the sleep call, silently
/// treating milliseconds as seconds. This keeps milliseconds throughout.
pub async fn wait_before_reconnect(retry_timeout_ms: i64) -> Outcome {
    if retry_timeout_ms < 0 {
        return Outcome::Stop;
    }
    if retry_timeout_ms > 0 {
        #[allow(clippy::cast_sign_loss)]
        sleep(Duration::from_millis(retry_timeout_ms as u64)).await;
    }
    Outcome::Reconnect
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_200_reconnects() {
        assert_eq!(classify_status(StatusCode::OK), Outcome::Reconnect);
    }

    #[test]
    fn http_503_reconnects() {
        assert_eq!(classify_status(StatusCode::SERVICE_UNAVAILABLE), Outcome::Reconnect);
    }

    #[test]
    fn http_404_stops() {
        assert_eq!(classify_status(StatusCode::NOT_FOUND), Outcome::Stop);
    }

    #[test]
    fn disconnect_without_keep_alive_stops() {
        assert_eq!(classify_disconnect(false), Outcome::Stop);
    }

    #[test]
    fn disconnect_with_keep_alive_reconnects() {
        assert_eq!(classify_disconnect(true), Outcome::Reconnect);
    }

    #[tokio::test]
    async fn negative_retry_timeout_stops_without_sleeping() {
        assert_eq!(wait_before_reconnect(-1).await, Outcome::Stop);
    }

    #[tokio::test]
    async fn zero_retry_timeout_reconnects_immediately() {
        assert_eq!(wait_before_reconnect(0).await, Outcome::Reconnect);
    }
}
