pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::documents::handlers as documents;
use crate::roast::handlers as roast;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Roast API
        .route("/api/v1/analyze", post(roast::handle_analyze))
        .route("/api/v1/rebuild", post(roast::handle_rebuild))
        // Legacy paths used by the first web client
        .route("/api/roast", post(roast::handle_analyze))
        .route("/api/rebuild", post(roast::handle_rebuild))
        // Documents API
        .route(
            "/api/v1/documents/extract",
            post(documents::handle_extract).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .with_state(state)
}
