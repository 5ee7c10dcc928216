use crate::registry::protocol::TaskView;
use crate::registry::types::now_ms;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// The external inference collaborator: `(model_id, input) -> output`.
///
/// Type-erased async closure so the scheduler stays generic over whatever
/// actually runs the model; a failure is opaque and treated as retryable.
pub type InferenceFn = Arc<
    dyn Fn(String, String) -> Pin<Box<dyn Future<Output = anyhow::Result<serde_json::Value>> + Send>>
        + Send
        + Sync,
>;

/// A task as tracked by the node-local queue, with its attempt bookkeeping.
#[derive(Debug, Clone)]
pub struct LocalTask {
    pub task_id: String,
    pub model_id: String,
    pub input: String,
    /// Whole-task attempts so far (execution plus delivery).
    pub retries: u32,
    /// Timestamp (ms) of the most recent attempt.
    pub last_attempt: u64,
}

impl LocalTask {
    pub fn new(task_id: &str, model_id: &str, input: &str) -> Self {
        Self {
            task_id: task_id.to_string(),
            model_id: model_id.to_string(),
            input: input.to_string(),
            retries: 0,
            last_attempt: 0,
        }
    }

    pub fn mark_attempt(&mut self) {
        self.retries += 1;
        self.last_attempt = now_ms();
    }

    pub fn is_retryable(&self, max_retries: u32) -> bool {
        self.retries < max_retries
    }
}

impl From<&TaskView> for LocalTask {
    fn from(view: &TaskView) -> Self {
        Self::new(&view.task_id.0, &view.model_id, &view.input)
    }
}

/// Scheduler tunables.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Number of concurrent workers in the pool.
    pub workers: usize,
    /// Whole-task retry ceiling; independent of the submitter's ceiling.
    pub max_task_retries: u32,
    /// How long an idle worker sleeps before polling the queue again.
    pub idle_poll: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            max_task_retries: 3,
            idle_poll: Duration::from_millis(100),
        }
    }
}
