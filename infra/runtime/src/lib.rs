//! # Runtime
//!
//! Tokio runtime profiles for the build tooling.
//!
//! Composition itself is synchronous; the runtime only drives artifact I/O and
//! fans several distribution builds out onto the blocking pool, so the profiles
//! mostly differ in how many blocking threads they allow.
//!
//! ## Profiles
//! * **Parallel builds**: one worker per core and a blocking pool large enough to
//!   compose every configured distribution at once.
//! * **Single build**: a minimal runtime for one-shot commands (`check`, `inspect`).
//!
//! ## Example
//!
//! ```rust,ignore
//! #[carve_runtime::main(parallel_builds)]
//! async fn main() -> anyhow::Result<()> {
//!     Ok(())
//! }
//! ```

pub use anyhow::Result;
pub use carve_derive::main;

use anyhow::anyhow;
use std::{sync::OnceLock, thread::available_parallelism, time::Duration};
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

/// The default number of worker threads if detection fails.
const DEFAULT_WORKER_THREADS: usize = 4;
/// Upper bound for both worker and blocking pools.
const MAX_THREADS: usize = 512;
/// Default number of threads in the blocking pool.
const DEFAULT_BLOCKING_THREADS: usize = 64;
/// The default stack size for threads (2 `MiB`).
const DEFAULT_STACK_SIZE: usize = 2 * 1024 * 1024;
/// Minimum allowed stack size (1 `MiB`).
const MIN_STACK_SIZE: usize = 1024 * 1024;
/// Maximum allowed stack size (16 `MiB`).
const MAX_STACK_SIZE: usize = 16 * 1024 * 1024;
/// How long an idle thread stays alive.
const THREAD_KEEP_ALIVE: Duration = Duration::from_secs(10);
const DEFAULT_THREAD_NAME: &str = "carve-worker";

static WORKER_THREADS: OnceLock<usize> = OnceLock::new();

/// Detects the worker count from `CARVE_WORKER_THREADS` or the hardware.
fn detect_worker_threads() -> usize {
    *WORKER_THREADS.get_or_init(|| {
        std::env::var("CARVE_WORKER_THREADS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|&n| n > 0 && n <= MAX_THREADS)
            .unwrap_or_else(|| {
                available_parallelism()
                    .map(std::num::NonZero::get)
                    .unwrap_or(DEFAULT_WORKER_THREADS)
            })
    })
}

/// Configuration for the Tokio runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub worker_threads: usize,
    pub max_blocking_threads: usize,
    pub stack_size: usize,
    pub thread_name: String,
    pub thread_keep_alive: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: detect_worker_threads(),
            max_blocking_threads: DEFAULT_BLOCKING_THREADS,
            stack_size: DEFAULT_STACK_SIZE,
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
            thread_keep_alive: THREAD_KEEP_ALIVE,
        }
    }
}

impl RuntimeConfig {
    /// Preset for building many distributions concurrently.
    #[must_use = "Use this configuration for concurrent distribution builds"]
    pub fn parallel_builds() -> Self {
        let workers = detect_worker_threads();
        Self {
            worker_threads: workers,
            max_blocking_threads: (workers * 4).clamp(1, MAX_THREADS),
            thread_name: "carve-build".to_owned(),
            ..Self::default()
        }
    }

    /// Preset for one-shot commands that compose a single distribution.
    #[must_use = "Use this configuration for single, short-lived commands"]
    pub fn single_build() -> Self {
        Self {
            worker_threads: 1,
            max_blocking_threads: 2,
            stack_size: MIN_STACK_SIZE,
            thread_name: "carve-single".to_owned(),
            thread_keep_alive: Duration::from_secs(1),
        }
    }

    #[must_use = "Customize the number of worker threads for the runtime"]
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads.clamp(1, MAX_THREADS);
        self
    }

    #[must_use = "Customize the size of the blocking pool"]
    pub fn with_max_blocking_threads(mut self, threads: usize) -> Self {
        self.max_blocking_threads = threads.clamp(1, MAX_THREADS);
        self
    }

    #[must_use = "Customize the stack size for worker threads"]
    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = size.clamp(MIN_STACK_SIZE, MAX_STACK_SIZE);
        self
    }

    #[must_use = "Customize the thread name"]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.thread_name = if name.trim().is_empty() { DEFAULT_THREAD_NAME.to_owned() } else { name };
        self
    }

    fn normalized(&self) -> Self {
        self.clone()
            .with_worker_threads(self.worker_threads)
            .with_max_blocking_threads(self.max_blocking_threads)
            .with_stack_size(self.stack_size)
            .with_thread_name(self.thread_name.clone())
    }
}

/// Creates a new multi-threaded Tokio runtime from `config`.
///
/// Out-of-range values are clamped before the runtime is built.
///
/// # Errors
///
/// Returns an [`anyhow::Error`] if the Tokio runtime cannot be created, typically due to
/// insufficient system resources or OS-level limitations.
pub fn build_runtime_with_config(config: &RuntimeConfig) -> Result<Runtime> {
    let config = config.normalized();
    debug!(config = ?config, "Building tokio runtime");

    Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .max_blocking_threads(config.max_blocking_threads)
        .thread_name(&config.thread_name)
        .thread_stack_size(config.stack_size)
        .thread_keep_alive(config.thread_keep_alive)
        .enable_all()
        .build()
        .map_err(|e| anyhow!("Failed to initialize runtime: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_threads_validation() {
        let config = RuntimeConfig::default().with_worker_threads(0);
        assert_eq!(config.worker_threads, 1);

        let config = RuntimeConfig::default().with_worker_threads(2000);
        assert_eq!(config.worker_threads, MAX_THREADS);
    }

    #[test]
    fn test_stack_size_validation() {
        let config = RuntimeConfig::default().with_stack_size(100);
        assert_eq!(config.stack_size, MIN_STACK_SIZE);

        let config = RuntimeConfig::default().with_stack_size(100 * 1024 * 1024);
        assert_eq!(config.stack_size, MAX_STACK_SIZE);
    }

    #[test]
    fn test_blank_thread_name_falls_back() {
        let config = RuntimeConfig::default().with_thread_name("   ");
        assert_eq!(config.thread_name, DEFAULT_THREAD_NAME);
    }

    #[test]
    fn test_parallel_profile_has_room_for_blocking_work() {
        let config = RuntimeConfig::parallel_builds();
        assert!(config.max_blocking_threads >= config.worker_threads);
    }

    #[test]
    fn test_runtime_runs_blocking_tasks() {
        let rt = build_runtime_with_config(&RuntimeConfig::single_build()).unwrap();
        let value = rt.block_on(async { tokio::task::spawn_blocking(|| 21 * 2).await.unwrap() });
        assert_eq!(value, 42);
    }
}
