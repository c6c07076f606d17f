/// HTTP trigger surface for the drive-mirror sync engine.
pub mod api;
pub mod config;
pub mod error;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::{DefaultMakeSpan, TraceLayer};

pub fn create_router(app_state: state::AppState) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/sync", post(api::trigger_sync))
        .layer(
            TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()),
        )
        .with_state(app_state)
}
