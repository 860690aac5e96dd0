//! Functional tests for X-Token authentication

#[path = "../common/mod.rs"]
mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use common::{app, body_json, image_request, settings, FakeEngine, API_KEY};
use image_tier_gateway::middleware::auth::AuthLayer;
use std::sync::Arc;
use tower::ServiceExt;

async fn create_test_app() -> Router {
    Router::new()
        .route("/test", axum::routing::get(|| async { "OK" }))
        .layer(AuthLayer::new("valid-key"))
}

#[tokio::test]
async fn test_auth_with_valid_token() {
    let app = create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/test")
                .header("x-token", "valid-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_auth_with_invalid_token() {
    let app = create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/test")
                .header("x-token", "invalid-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["detail"], "X-Token header invalid");
}

#[tokio::test]
async fn test_auth_without_header() {
    let app = create_test_app().await;

    let response = app
        .oneshot(Request::builder().uri("/test").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["detail"], "X-Token header invalid");
}

#[tokio::test]
async fn test_auth_ignores_bearer_authorization() {
    let app = create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/test")
                .header("authorization", "Bearer valid-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_health_endpoint_bypass() {
    let app = Router::new()
        .route("/health", axum::routing::get(|| async { "healthy" }))
        .route("/test", axum::routing::get(|| async { "OK" }))
        .layer(AuthLayer::new("valid-key"));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_token_never_reaches_dispatcher() {
    let engine = Arc::new(FakeEngine::default());
    let (app, state) = app(settings(), engine.clone());

    let response = app
        .oneshot(image_request(r#"{"prompt": "a red circle"}"#, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(state.dispatcher.attempts(), 0);
    assert_eq!(engine.loads(), 0);
    assert_eq!(engine.releases(), 0);
}

#[tokio::test]
async fn test_wrong_token_never_reaches_dispatcher() {
    let engine = Arc::new(FakeEngine::default());
    let (app, state) = app(settings(), engine.clone());

    let response = app
        .oneshot(image_request(
            r#"{"prompt": "a red circle", "image_quality": "low"}"#,
            Some("not-the-secret"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["detail"], "X-Token header invalid");
    assert_eq!(state.dispatcher.attempts(), 0);
    assert_eq!(engine.releases(), 0);
}

#[tokio::test]
async fn test_token_prefix_is_rejected() {
    let engine = Arc::new(FakeEngine::default());
    let (app, state) = app(settings(), engine);

    let response = app
        .oneshot(image_request(r#"{"prompt": "x"}"#, Some(&API_KEY[..4])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(state.dispatcher.attempts(), 0);
}
