//! Dashboard API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! The dashboard frontend is served from a separate origin, so CORS is
//! wide open; the API carries no credentials or server-side session.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use super::endpoints;
use super::types::ApiContext;

/// Build the dashboard API router.
pub fn dashboard_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/patient/:id", get(endpoints::records::patient))
        .route("/allergies/:id", get(endpoints::records::allergies))
        .route("/medications/:id", get(endpoints::records::medications))
        .route(
            "/check-prescription",
            post(endpoints::safety::check_prescription),
        )
        .with_state(ctx)
        .layer(CorsLayer::permissive())
}
