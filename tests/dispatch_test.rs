// ABOUTME: End-to-end tests for the poster/subscriber HTTP surface
// ABOUTME: Drives the router with tower::ServiceExt::oneshot, no bound socket required
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use sse_relay::event::Variant;
use sse_relay::routes::{router, AppState};
use std::time::Duration;
use tower::ServiceExt;

fn app(variant: Variant) -> axum::Router {
    router(AppState::new(variant, Duration::from_millis(50)))
}

#[tokio::test]
async fn subscribe_then_post_delivers_one_event() {
    let app = app(Variant::StringId);

    let subscribe = app
        .clone()
        .oneshot(Request::get("/poll/t1").body(Body::empty()).expect("request"))
        .await
        .expect("subscribe response");
    assert_eq!(subscribe.status(), StatusCode::OK);
    assert_eq!(
        subscribe
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .expect("content-type"),
        "text/event-stream"
    );

    let post = app
        .clone()
        .oneshot(
            Request::post("/ping/t1")
                .body(Body::from("hello"))
                .expect("request"),
        )
        .await
        .expect("post response");
    assert_eq!(post.status(), StatusCode::OK);

    app.clone()
        .oneshot(
            Request::post("/close/t1")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("close response");

    let body = body_text(subscribe).await;
    assert!(body.contains("event: ping"));
    assert!(body.contains("data: hello"));
    assert!(body.contains("id:"));

    // §4.3 grammar / §8 invariant: id precedes event on id-enabled variants.
    let id_pos = body.find("id:").expect("id field present");
    let event_pos = body.find("event: ping").expect("event field present");
    assert!(
        id_pos < event_pos,
        "expected id: to precede event: ping, got: {body:?}"
    );
}

#[tokio::test]
async fn second_subscriber_for_same_target_is_locked() {
    let app = app(Variant::String);

    let first = app
        .clone()
        .oneshot(Request::get("/poll/t1").body(Body::empty()).expect("request"))
        .await
        .expect("first subscribe");
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .clone()
        .oneshot(Request::get("/poll/t1").body(Body::empty()).expect("request"))
        .await
        .expect("second subscribe");
    assert_eq!(second.status(), StatusCode::LOCKED);
}

#[tokio::test]
async fn post_with_invalid_json_on_json_variant_is_rejected() {
    let app = app(Variant::Json);

    let _subscribe = app
        .clone()
        .oneshot(Request::get("/poll/t1").body(Body::empty()).expect("request"))
        .await
        .expect("subscribe");

    let post = app
        .clone()
        .oneshot(
            Request::post("/ping/t1")
                .body(Body::from("not json"))
                .expect("request"),
        )
        .await
        .expect("post");
    assert_eq!(post.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn close_action_bypasses_json_validation() {
    let app = app(Variant::JsonId);

    let subscribe = app
        .clone()
        .oneshot(Request::get("/poll/t1").body(Body::empty()).expect("request"))
        .await
        .expect("subscribe");

    let post = app
        .clone()
        .oneshot(
            Request::post("/close/t1")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("post");
    assert_eq!(post.status(), StatusCode::OK);

    // the close drains the dispatch loop; the stream body ends without error.
    let _ = body_text(subscribe).await;
}

#[tokio::test]
async fn retry_action_is_not_emitted_as_an_event() {
    let app = app(Variant::StringId);

    let subscribe = app
        .clone()
        .oneshot(Request::get("/poll/t1").body(Body::empty()).expect("request"))
        .await
        .expect("subscribe");

    app.clone()
        .oneshot(
            Request::post("/retry/t1")
                .body(Body::from("5000"))
                .expect("request"),
        )
        .await
        .expect("retry post");
    app.clone()
        .oneshot(
            Request::post("/close/t1")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("close post");

    let body = body_text(subscribe).await;
    assert!(!body.contains("event: retry"));
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("collect body");
    String::from_utf8_lossy(&bytes).into_owned()
}
