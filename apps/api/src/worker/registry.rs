use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::worker::WorkerError;

/// A named unit of background work.
///
/// Task modules implement this and register an instance with the
/// [`TaskRegistry`] from their `register_tasks` hook.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn run(&self, payload: &Value) -> anyhow::Result<()>;
}

/// Hook each task module exposes so the bootstrap can collect its handlers.
pub type RegisterFn = fn(&mut TaskRegistry) -> Result<(), WorkerError>;

#[derive(Default, Clone)]
pub struct TaskRegistry {
    handlers: BTreeMap<String, Arc<dyn TaskHandler>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: Arc<dyn TaskHandler>,
    ) -> Result<(), WorkerError> {
        let name = name.into();
        if self.handlers.contains_key(&name) {
            return Err(WorkerError::DuplicateTask(name));
        }
        self.handlers.insert(name, handler);
        Ok(())
    }

    /// Runs every hook in order, stopping at the first failure.
    pub fn discover(&mut self, modules: &[RegisterFn]) -> Result<(), WorkerError> {
        for register in modules {
            register(self)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn TaskHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    #[async_trait]
    impl TaskHandler for Noop {
        async fn run(&self, _payload: &Value) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn register_a(registry: &mut TaskRegistry) -> Result<(), WorkerError> {
        registry.register("tests.a", Arc::new(Noop))
    }

    fn register_b(registry: &mut TaskRegistry) -> Result<(), WorkerError> {
        registry.register("tests.b", Arc::new(Noop))
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = TaskRegistry::new();
        registry.register("tests.a", Arc::new(Noop)).unwrap();
        assert!(registry.contains("tests.a"));
        assert!(registry.get("tests.a").is_some());
        assert!(registry.get("tests.missing").is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = TaskRegistry::new();
        registry.register("tests.a", Arc::new(Noop)).unwrap();
        let err = registry.register("tests.a", Arc::new(Noop)).unwrap_err();
        assert!(matches!(err, WorkerError::DuplicateTask(name) if name == "tests.a"));
    }

    #[test]
    fn test_discover_runs_every_hook() {
        let mut registry = TaskRegistry::new();
        registry.discover(&[register_b, register_a]).unwrap();
        assert_eq!(registry.names(), vec!["tests.a", "tests.b"]);
    }

    #[test]
    fn test_discover_stops_on_duplicate() {
        let mut registry = TaskRegistry::new();
        assert!(registry.discover(&[register_a, register_a]).is_err());
    }
}
