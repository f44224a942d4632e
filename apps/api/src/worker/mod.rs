//! Worker bootstrap.
//!
//! [`WorkerApp`] is built once at startup from a [`WorkerConfig`] and shared
//! through `AppState`. It owns the task registry and enqueues
//! [`TaskEnvelope`]s onto a Redis list; the process that pops and runs them
//! lives outside this service.

pub mod config;
pub mod registry;
pub mod tasks;

use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

pub use config::{PoolMode, WorkerConfig};
pub use registry::{TaskHandler, TaskRegistry};

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("Task already registered: {0}")]
    DuplicateTask(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Envelope encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Task {task} failed: {source}")]
    TaskFailed {
        task: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Wire form of a queued task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEnvelope {
    pub id: Uuid,
    pub task: String,
    pub payload: Value,
    pub retries: u32,
    pub max_retries: u32,
    pub enqueued_at: DateTime<Utc>,
}

pub struct WorkerApp {
    config: WorkerConfig,
    registry: TaskRegistry,
    broker: redis::Client,
}

impl WorkerApp {
    /// Builds the app and runs every task module's registration hook.
    pub fn bootstrap(config: WorkerConfig, broker: redis::Client) -> Result<Self, WorkerError> {
        let mut registry = TaskRegistry::new();
        registry.discover(tasks::TASK_MODULES)?;
        info!(
            "Worker '{}' ready: pool={} concurrency={} queue={} tasks={:?}",
            config.app_name,
            config.pool,
            config.concurrency,
            config.queue_key(),
            registry.names()
        );
        Ok(Self::with_registry(config, registry, broker))
    }

    pub fn with_registry(config: WorkerConfig, registry: TaskRegistry, broker: redis::Client) -> Self {
        WorkerApp {
            config,
            registry,
            broker,
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Wraps `payload` for a registered task.
    pub fn envelope(&self, task: &str, payload: Value) -> Result<TaskEnvelope, WorkerError> {
        if !self.registry.contains(task) {
            return Err(WorkerError::UnknownTask(task.to_string()));
        }
        Ok(TaskEnvelope {
            id: Uuid::new_v4(),
            task: task.to_string(),
            payload,
            retries: 0,
            max_retries: self.config.max_retries,
            enqueued_at: Utc::now(),
        })
    }

    /// Pushes a new envelope onto the queue and returns its id.
    pub async fn enqueue(&self, task: &str, payload: Value) -> Result<Uuid, WorkerError> {
        let envelope = self.envelope(task, payload)?;
        self.push(&envelope).await?;
        info!("Enqueued {} ({})", envelope.task, envelope.id);
        Ok(envelope.id)
    }

    async fn push(&self, envelope: &TaskEnvelope) -> Result<(), WorkerError> {
        let body = serde_json::to_string(envelope)?;
        let mut conn = self.broker.get_multiplexed_async_connection().await?;
        conn.lpush::<_, _, ()>(self.config.queue_key(), body).await?;
        Ok(())
    }

    /// Runs the handler registered for `envelope.task`.
    pub async fn dispatch(&self, envelope: &TaskEnvelope) -> Result<(), WorkerError> {
        let handler = self
            .registry
            .get(&envelope.task)
            .ok_or_else(|| WorkerError::UnknownTask(envelope.task.clone()))?;

        handler
            .run(&envelope.payload)
            .await
            .map_err(|source| WorkerError::TaskFailed {
                task: envelope.task.clone(),
                source,
            })
    }

    /// The envelope to schedule after a failed attempt, or `None` once retries
    /// are exhausted.
    pub fn next_attempt(&self, envelope: &TaskEnvelope) -> Option<TaskEnvelope> {
        if envelope.retries >= envelope.max_retries {
            warn!(
                "Task {} ({}) exhausted {} retries",
                envelope.task, envelope.id, envelope.max_retries
            );
            return None;
        }
        Some(TaskEnvelope {
            retries: envelope.retries + 1,
            enqueued_at: Utc::now()
                + chrono::Duration::seconds(i64::from(self.config.retry_countdown_secs)),
            ..envelope.clone()
        })
    }
}
