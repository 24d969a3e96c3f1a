//! [`Scheduler`] – the task scheduler that owns execution after boot.
//!
//! Backed by a current-thread Tokio runtime so it behaves like an RTOS
//! scheduler that has not been started yet: tasks spawned through
//! [`Scheduler::handle`] during bring-up are queued, and none of them runs
//! until [`Scheduler::run_until`] hands the boot thread over.

use std::future::Future;

use nodeup_types::NodeError;
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::info;

pub struct Scheduler {
    runtime: Runtime,
}

impl Scheduler {
    /// Build the scheduler. No task runs until [`run_until`][Self::run_until].
    ///
    /// # Errors
    ///
    /// [`NodeError::Internal`] when the runtime cannot be created.
    pub fn new() -> Result<Self, NodeError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| NodeError::Internal(format!("scheduler runtime: {e}")))?;
        Ok(Self { runtime })
    }

    /// Handle used to create tasks before and after the scheduler starts.
    pub fn handle(&self) -> Handle {
        self.runtime.handle().clone()
    }

    /// Start scheduling tasks on the calling thread until `shutdown`
    /// completes. On a device `shutdown` never completes.
    ///
    /// All tasks are dropped when this returns.
    pub fn run_until<F: Future>(self, shutdown: F) -> F::Output {
        info!("scheduler started");
        let output = self.runtime.block_on(shutdown);
        info!("scheduler stopped");
        output
    }
}
