use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use std::sync::{Arc, RwLock};

pub mod handlers;
pub mod responses;

pub fn router(state: Arc<RwLock<AppState>>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::get_health))
        .route("/api/estimate", post(handlers::post_estimate))
        .route("/api/batch", post(handlers::post_batch))
        .route("/api/report", get(handlers::get_report))
        .with_state(state)
}
