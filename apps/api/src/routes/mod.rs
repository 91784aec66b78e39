pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::checker::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/resume-checker",
            post(handlers::handle_check_resume).fallback(handlers::method_not_allowed),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
