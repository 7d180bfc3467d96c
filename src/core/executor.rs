//! Background task runner for connection attempts
//!
//! Connection attempts open devices and sleep through the handshake settle
//! delay, so they run on a small tokio runtime owned by the executor and
//! never on the controller thread.

use std::future::Future;
use thiserror::Error;
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Executor errors
#[derive(Error, Debug)]
pub enum ExecutorError {
    /// Worker count of zero
    #[error("Executor needs at least one worker thread")]
    NoWorkers,

    /// Runtime could not be built
    #[error("Could not start executor runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Bounded pool of worker threads
pub struct Executor {
    runtime: Runtime,
}

impl Executor {
    /// Start an executor with `worker_threads` workers
    pub fn new(worker_threads: usize) -> Result<Self, ExecutorError> {
        if worker_threads == 0 {
            return Err(ExecutorError::NoWorkers);
        }

        let runtime = Builder::new_multi_thread()
            .worker_threads(worker_threads)
            .thread_name("sensorlink-worker")
            .enable_all()
            .build()?;

        debug!(worker_threads, "executor started");
        Ok(Self { runtime })
    }

    /// Run `future` on a worker thread
    pub fn spawn<F>(&self, future: F) -> TaskHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        TaskHandle {
            inner: self.runtime.spawn(future),
        }
    }
}

/// Handle to a spawned task
#[derive(Debug)]
pub struct TaskHandle {
    inner: JoinHandle<()>,
}

impl TaskHandle {
    /// Block the calling thread until the task ends
    ///
    /// Must not be called from inside the executor's own workers.
    pub fn join(self) {
        if let Err(e) = futures::executor::block_on(self.inner) {
            warn!(error = %e, "worker task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_rejects_zero_workers() {
        assert!(matches!(Executor::new(0), Err(ExecutorError::NoWorkers)));
    }

    #[test]
    fn test_spawn_and_join() {
        let executor = Executor::new(1).unwrap();
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);

        let handle = executor.spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            flag.store(true, Ordering::SeqCst);
        });
        handle.join();

        assert!(ran.load(Ordering::SeqCst));
    }
}
