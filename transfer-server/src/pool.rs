//! Bounded pool for CPU-bound work.
//!
//! Graph builds and path searches run on tokio's blocking threads. A
//! semaphore caps how many run at once so a burst of requests queues instead
//! of fanning out.

use std::sync::Arc;

use tokio::sync::Semaphore;

/// Error returned when blocking work could not complete.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// The semaphore was closed
    #[error("worker pool closed")]
    Closed,

    /// The blocking task panicked or was cancelled
    #[error("worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Default number of concurrent blocking jobs.
pub const DEFAULT_WORKERS: usize = 4;

/// A semaphore-gated handle to `spawn_blocking`.
#[derive(Debug, Clone)]
pub struct BlockingPool {
    permits: Arc<Semaphore>,
}

impl BlockingPool {
    /// Create a pool allowing `workers` concurrent jobs (at least one).
    pub fn new(workers: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Run `f` on a blocking thread once a permit is available.
    pub async fn run<F, R>(&self, f: F) -> Result<R, PoolError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| PoolError::Closed)?;
        let result = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            f()
        })
        .await?;
        Ok(result)
    }

    /// Permits currently free.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

impl Default for BlockingPool {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}
