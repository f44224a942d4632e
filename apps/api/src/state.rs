use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::worker::WorkerApp;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Task-queue bootstrap, built once at startup. Owns the Redis broker client.
    pub worker: Arc<WorkerApp>,
}
