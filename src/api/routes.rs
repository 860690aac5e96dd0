//! Router construction

use axum::{
    routing::{get, post},
    Router,
};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api::handlers;
use crate::middleware::{AuthLayer, RateLimitLayer};
use crate::AppState;

/// Build the application router with its middleware stack
///
/// Authentication runs before rate limiting so rejected callers do not use
/// up the quota.
pub fn create_router(state: Arc<AppState>) -> Router {
    let settings = state.settings.clone();

    let mut router = Router::new()
        .route("/image", post(handlers::generate_image))
        .route("/health", get(handlers::health))
        .with_state(state);

    if settings.rate_limit.enabled {
        router = router.layer(RateLimitLayer::from_config(&settings.rate_limit));
    }

    router
        .layer(AuthLayer::new(settings.api_key.expose_secret().clone()))
        .layer(TraceLayer::new_for_http())
}
