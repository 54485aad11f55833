//! Host scheduler configuration

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::runtime::{Builder, Runtime};

use crate::error::{TaskError, TaskResult};

/// Configuration for the Tokio runtime that hosts spawned tasks
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Worker threads; `None` lets Tokio use one per CPU core
    #[serde(default)]
    pub worker_threads: Option<usize>,
    /// Name given to each worker thread
    #[serde(default = "default_thread_name")]
    pub thread_name: String,
    /// Upper bound on threads running `spawn_blocking` closures
    #[serde(default = "default_max_blocking_threads")]
    pub max_blocking_threads: usize,
    /// Default bound for coordinators that opt into timed waits
    #[serde(default)]
    pub recv_timeout_ms: Option<u64>,
}

fn default_thread_name() -> String {
    "handoff-worker".to_string()
}

fn default_max_blocking_threads() -> usize {
    64
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            thread_name: default_thread_name(),
            max_blocking_threads: default_max_blocking_threads(),
            recv_timeout_ms: None,
        }
    }
}

impl SchedulerConfig {
    /// Parse a configuration from JSON, filling missing fields with defaults
    ///
    /// # Errors
    ///
    /// Returns `TaskError::Config` if the JSON is malformed or a value is
    /// out of range.
    pub fn from_json_str(json: &str) -> TaskResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| TaskError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    ///
    /// # Errors
    ///
    /// Returns `TaskError::Config` if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> TaskResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| TaskError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    /// Check that thread counts are usable
    ///
    /// # Errors
    ///
    /// Returns `TaskError::Config` for zero thread counts.
    pub fn validate(&self) -> TaskResult<()> {
        if self.worker_threads == Some(0) {
            return Err(TaskError::Config("worker_threads must be at least 1".to_string()));
        }
        if self.max_blocking_threads == 0 {
            return Err(TaskError::Config(
                "max_blocking_threads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Default receive timeout, if configured
    #[must_use]
    pub fn recv_timeout(&self) -> Option<Duration> {
        self.recv_timeout_ms.map(Duration::from_millis)
    }

    /// Build the multi-threaded runtime described by this configuration
    ///
    /// # Errors
    ///
    /// Returns `TaskError::Config` if the configuration is invalid or the
    /// runtime cannot be started.
    pub fn build_runtime(&self) -> TaskResult<Runtime> {
        self.validate()?;
        let mut builder = Builder::new_multi_thread();
        builder
            .thread_name(self.thread_name.clone())
            .max_blocking_threads(self.max_blocking_threads)
            .enable_all();
        if let Some(workers) = self.worker_threads {
            builder.worker_threads(workers);
        }
        let runtime = builder
            .build()
            .map_err(|e| TaskError::Config(format!("failed to start runtime: {e}")))?;
        tracing::info!(
            worker_threads = ?self.worker_threads,
            thread_name = %self.thread_name,
            "scheduler runtime started"
        );
        Ok(runtime)
    }
}
