use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;

/// Environment namespace for worker settings (`WORKER_BROKER_URL`, ...).
pub const ENV_NAMESPACE: &str = "WORKER_";

const DEFAULT_APP_NAME: &str = "easyapply";
const DEFAULT_QUEUE: &str = "default";
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_COUNTDOWN_SECS: u32 = 60;

/// How the external worker process executes tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolMode {
    /// Single process, single thread.
    Solo,
    Prefork,
    Threads,
}

impl PoolMode {
    /// Windows cannot fork, so workers there run solo.
    pub fn platform_default() -> Self {
        Self::for_platform(cfg!(windows))
    }

    fn for_platform(windows: bool) -> Self {
        if windows {
            PoolMode::Solo
        } else {
            PoolMode::Prefork
        }
    }
}

impl FromStr for PoolMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "solo" => Ok(PoolMode::Solo),
            "prefork" => Ok(PoolMode::Prefork),
            "threads" => Ok(PoolMode::Threads),
            other => Err(anyhow!("unknown worker pool '{other}'")),
        }
    }
}

impl fmt::Display for PoolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PoolMode::Solo => "solo",
            PoolMode::Prefork => "prefork",
            PoolMode::Threads => "threads",
        };
        f.write_str(name)
    }
}

/// Task-queue settings, built once at startup and handed to the worker
/// bootstrap by reference.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerConfig {
    pub app_name: String,
    #[serde(skip)]
    pub broker_url: String,
    pub queue: String,
    pub pool: PoolMode,
    pub concurrency: usize,
    pub max_retries: u32,
    pub retry_countdown_secs: u32,
}

impl WorkerConfig {
    /// Reads `WORKER_*` variables from the process environment.
    pub fn from_env(fallback_broker_url: &str) -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), fallback_broker_url)
    }

    /// Builds the config from any key lookup. `lookup` receives fully
    /// namespaced keys.
    pub fn from_lookup<F>(lookup: F, fallback_broker_url: &str) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{ENV_NAMESPACE}{name}"));

        let pool = match get("POOL") {
            Some(raw) => raw.parse::<PoolMode>()?,
            None => PoolMode::platform_default(),
        };

        let concurrency = match (pool, get("CONCURRENCY")) {
            (PoolMode::Solo, _) => 1,
            (_, Some(raw)) => raw
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .context("WORKER_CONCURRENCY must be a positive integer")?,
            (_, None) => std::thread::available_parallelism()
                .map(usize::from)
                .unwrap_or(1),
        };

        Ok(WorkerConfig {
            app_name: get("APP_NAME").unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
            broker_url: get("BROKER_URL").unwrap_or_else(|| fallback_broker_url.to_string()),
            queue: get("QUEUE").unwrap_or_else(|| DEFAULT_QUEUE.to_string()),
            pool,
            concurrency,
            max_retries: match get("MAX_RETRIES") {
                Some(raw) => raw
                    .parse()
                    .context("WORKER_MAX_RETRIES must be a non-negative integer")?,
                None => DEFAULT_MAX_RETRIES,
            },
            retry_countdown_secs: match get("RETRY_COUNTDOWN_SECS") {
                Some(raw) => raw
                    .parse()
                    .context("WORKER_RETRY_COUNTDOWN_SECS must be a number of seconds")?,
                None => DEFAULT_RETRY_COUNTDOWN_SECS,
            },
        })
    }

    /// Redis list that holds pending envelopes.
    pub fn queue_key(&self) -> String {
        format!("{}:queue:{}", self.app_name, self.queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const FALLBACK: &str = "redis://localhost:6379";

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_fall_back_to_main_redis() {
        let config = WorkerConfig::from_lookup(lookup(&[]), FALLBACK).unwrap();
        assert_eq!(config.app_name, "easyapply");
        assert_eq!(config.broker_url, FALLBACK);
        assert_eq!(config.queue, "default");
        assert_eq!(config.pool, PoolMode::platform_default());
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_countdown_secs, 60);
        assert!(config.concurrency >= 1);
    }

    #[test]
    fn test_namespaced_keys_are_read() {
        let config = WorkerConfig::from_lookup(
            lookup(&[
                ("WORKER_BROKER_URL", "redis://broker:6379/2"),
                ("WORKER_QUEUE", "emails"),
                ("WORKER_POOL", "threads"),
                ("WORKER_CONCURRENCY", "4"),
                ("WORKER_MAX_RETRIES", "5"),
            ]),
            FALLBACK,
        )
        .unwrap();
        assert_eq!(config.broker_url, "redis://broker:6379/2");
        assert_eq!(config.queue_key(), "easyapply:queue:emails");
        assert_eq!(config.pool, PoolMode::Threads);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.max_retries, 5);
    }

    #[test]
    fn test_unprefixed_keys_ignored() {
        let config = WorkerConfig::from_lookup(lookup(&[("QUEUE", "emails")]), FALLBACK).unwrap();
        assert_eq!(config.queue, "default");
    }

    #[test]
    fn test_solo_pool_forces_single_worker() {
        let config = WorkerConfig::from_lookup(
            lookup(&[("WORKER_POOL", "solo"), ("WORKER_CONCURRENCY", "8")]),
            FALLBACK,
        )
        .unwrap();
        assert_eq!(config.pool, PoolMode::Solo);
        assert_eq!(config.concurrency, 1);
    }

    #[test]
    fn test_platform_default_pool() {
        assert_eq!(PoolMode::for_platform(true), PoolMode::Solo);
        assert_eq!(PoolMode::for_platform(false), PoolMode::Prefork);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(WorkerConfig::from_lookup(lookup(&[("WORKER_POOL", "gevent")]), FALLBACK).is_err());
        assert!(WorkerConfig::from_lookup(
            lookup(&[("WORKER_POOL", "prefork"), ("WORKER_CONCURRENCY", "0")]),
            FALLBACK
        )
        .is_err());
    }

    #[test]
    fn test_pool_mode_round_trips_through_display() {
        for mode in [PoolMode::Solo, PoolMode::Prefork, PoolMode::Threads] {
            assert_eq!(mode.to_string().parse::<PoolMode>().unwrap(), mode);
        }
    }
}
