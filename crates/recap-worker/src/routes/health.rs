use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: HashMap<String, String>,
}

/// Reports queue and storage connectivity; `503` when either is down
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let mut services = HashMap::new();
    
    let queue_ok = state.queue.ping().await.is_ok();
    let store_ok = state.store.ping().await.is_ok();
    services.insert("queue".to_string(), connectivity(queue_ok));
    services.insert("storage".to_string(), connectivity(store_ok));
    
    let (status, label) = if queue_ok && store_ok {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };
    
    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            services,
        }),
    )
}

fn connectivity(ok: bool) -> String {
    if ok { "connected" } else { "disconnected" }.to_string()
}
