use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};
use crate::backend::{ExecutionStatus, FormBackend};
use crate::error::BackendError;

/// Transient failures tolerated in a row before polling gives up.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 5;

/// Polls an execution's status on a fixed interval until it reaches a
/// terminal state. An unknown execution id, or too many failed checks in a
/// row, ends the loop with an error.
pub struct ExecutionPoller {
    backend: Arc<dyn FormBackend>,
    period: Duration,
}

/// Handle to a running poll loop. Dropping it stops the loop.
pub struct PollHandle {
    task: Option<JoinHandle<Result<ExecutionStatus, BackendError>>>,
}

impl ExecutionPoller {
    pub fn new(backend: Arc<dyn FormBackend>, period: Duration) -> Self {
        Self { backend, period }
    }

    /// Starts polling `execution_id`. `on_update` sees every status received,
    /// including the terminal one.
    pub fn start<F>(&self, execution_id: &str, mut on_update: F) -> PollHandle
    where
        F: FnMut(&ExecutionStatus) + Send + 'static,
    {
        let backend = self.backend.clone();
        let period = self.period;
        let execution_id = execution_id.to_string();

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut failures = 0;
            loop {
                ticker.tick().await;
                match backend.execution_status(&execution_id).await {
                    Ok(status) => {
                        failures = 0;
                        debug!(execution_id = %execution_id, status = ?status.status, "Execution status");
                        on_update(&status);
                        if status.status.is_terminal() {
                            info!(execution_id = %execution_id, status = ?status.status, "Execution finished");
                            return Ok(status);
                        }
                    }
                    Err(e @ BackendError::NotFound(_)) => {
                        error!(execution_id = %execution_id, "Execution not found; polling stopped");
                        return Err(e);
                    }
                    Err(e) => {
                        failures += 1;
                        warn!(execution_id = %execution_id, error = %e, failures, "Status check failed");
                        if failures >= MAX_CONSECUTIVE_FAILURES {
                            error!(execution_id = %execution_id, error = %e, "Giving up on execution status");
                            return Err(e);
                        }
                    }
                }
            }
        });

        PollHandle { task: Some(task) }
    }
}

impl PollHandle {
    pub fn cancel(&self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map(|t| t.is_finished()).unwrap_or(true)
    }

    /// Waits for the terminal status. `Ok(None)` when the loop was
    /// cancelled, `Err` when polling gave up.
    pub async fn wait(mut self) -> Result<Option<ExecutionStatus>, BackendError> {
        // Borrow rather than take, so dropping this future still aborts the loop
        let Some(task) = self.task.as_mut() else {
            return Ok(None);
        };
        let joined = task.await;
        self.task = None;
        match joined {
            Ok(result) => result.map(Some),
            Err(_) => Ok(None),
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
