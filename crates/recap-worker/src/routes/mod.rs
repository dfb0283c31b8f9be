pub mod health;
pub mod jobs;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{middleware::logging, state::AppState};

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/jobs", post(jobs::create_job))
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs/:job_id", get(jobs::get_job))
        .layer(middleware::from_fn(logging::log_request))
        .layer(TimeoutLayer::new(state.config.request_timeout()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
