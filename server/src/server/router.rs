use axum::{Router, extract::DefaultBodyLimit, routing::post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::api;
use crate::app::SharedState;

/// Create the axum router.
pub fn create_router(state: SharedState) -> Router {
    let body_limit = state.config().max_upload_bytes;

    Router::new()
        .route("/generate", post(api::generate::generate_qr))
        // --- Middleware ---
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
