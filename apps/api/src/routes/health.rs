use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service version and the worker settings this process enqueues with.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let worker = state.worker.config();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "easyapply-api",
        "worker": {
            "app": worker.app_name,
            "queue": worker.queue_key(),
            "pool": worker.pool,
            "concurrency": worker.concurrency,
            "tasks": state.worker.registry().names(),
        }
    }))
}
