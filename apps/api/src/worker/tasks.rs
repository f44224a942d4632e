//! Tasks owned by the worker itself.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::worker::registry::{RegisterFn, TaskHandler, TaskRegistry};
use crate::worker::WorkerError;

pub const PING: &str = "easyapply.ping";

/// Hooks run by the bootstrap, in order. Domain modules that define tasks
/// add their `register_tasks` here.
pub const TASK_MODULES: &[RegisterFn] = &[register_tasks];

/// Liveness probe: succeeds without side effects.
pub struct Ping;

#[async_trait]
impl TaskHandler for Ping {
    async fn run(&self, payload: &Value) -> anyhow::Result<()> {
        info!("pong {payload}");
        Ok(())
    }
}

pub fn register_tasks(registry: &mut TaskRegistry) -> Result<(), WorkerError> {
    registry.register(PING, Arc::new(Ping))
}
