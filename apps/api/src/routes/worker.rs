use axum::{
    extract::State,
    http::{Method, StatusCode},
    Json,
};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::permissions::{authorize, is_safe_method, is_superuser_or_read_only, Principal};
use crate::state::AppState;
use crate::worker::tasks::PING;

/// POST /api/v1/worker/ping
///
/// Enqueues the built-in ping task so operators can confirm a worker is
/// draining the queue.
pub async fn handle_worker_ping(
    State(state): State<AppState>,
    method: Method,
    principal: Principal,
) -> Result<(StatusCode, Json<Value>), AppError> {
    authorize(
        &principal,
        is_superuser_or_read_only(&principal, is_safe_method(&method)),
    )?;

    let task_id = state
        .worker
        .enqueue(PING, json!({ "requested_by": principal.user_id()? }))
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "task": PING, "task_id": task_id })),
    ))
}
