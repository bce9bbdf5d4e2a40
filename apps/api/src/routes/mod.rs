pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::catalogue::handlers as catalogue;
use crate::generation::handlers as generation;
use crate::session;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session ("sidebar" inputs)
        .route(
            "/api/v1/session",
            get(session::handle_get_session).put(session::handle_update_session),
        )
        // Catalogue API
        .route("/api/v1/catalogue", get(catalogue::handle_summary))
        .route("/api/v1/catalogue/upload", post(catalogue::handle_upload))
        .route("/api/v1/catalogue/search", get(catalogue::handle_search))
        // Cover letter API
        .route(
            "/api/v1/cover-letter",
            post(generation::handle_cover_letter),
        )
        .with_state(state)
}
