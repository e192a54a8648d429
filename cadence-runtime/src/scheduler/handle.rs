use crate::bridge::ExecutionBridge;
use crate::error::SchedulerError;
use std::sync::Arc;
use tokio_cron_scheduler::JobScheduler;

/// Handle for a running scheduler. Used to control and shut down the
/// engine and the interval loops.
pub struct SchedulerHandle {
    pub(crate) engine: JobScheduler,
    pub(crate) interval_handles: Vec<tokio::task::JoinHandle<()>>,
    pub(crate) bridge: Arc<ExecutionBridge>,
}

impl SchedulerHandle {
    /// Bridge the engine dispatches into; exposed so an embedding
    /// application can drive one-off executions by key.
    pub fn bridge(&self) -> Arc<ExecutionBridge> {
        self.bridge.clone()
    }

    /// Shutdown the engine, abort all interval tasks and close the
    /// worker pool so late firings are dropped.
    pub async fn shutdown(mut self) -> Result<(), SchedulerError> {
        self.engine.shutdown().await?;
        for handle in self.interval_handles {
            handle.abort();
        }
        self.bridge.close();
        Ok(())
    }
}
