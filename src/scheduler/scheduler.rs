//! Node-Local Task Scheduler
//!
//! A bounded pool of workers drawing from a local, node-owned queue (distinct
//! from the sequencer's task table). Each attempt runs inference through the
//! injected collaborator, obtains a DACert from the committee, and delivers
//! the certified result through the retrying submitter. A failed attempt is
//! re-enqueued while the whole-task retry ceiling allows; afterwards the task
//! is parked in the terminal failed list and reported.

use super::submitter::RetryingSubmitter;
use super::types::{InferenceFn, LocalTask, SchedulerConfig};
use crate::committee::signer::Committee;

use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

pub struct TaskScheduler {
    node_id: String,
    /// Local execution queue, owned exclusively by this node process.
    queue: Mutex<VecDeque<LocalTask>>,
    /// Tasks accepted locally and not yet terminal.
    active: DashMap<String, LocalTask>,
    /// Tasks whose retry ceiling is exhausted. Terminal bookkeeping; the
    /// sequencer-side record is untouched and will be reassigned by sweep.
    failed: DashMap<String, LocalTask>,
    inference: InferenceFn,
    committee: Arc<Committee>,
    submitter: Arc<RetryingSubmitter>,
    /// Full URL of the sequencer's result endpoint.
    submit_endpoint: String,
    config: SchedulerConfig,
    shutdown: CancellationToken,
}

impl TaskScheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        node_id: &str,
        inference: InferenceFn,
        committee: Arc<Committee>,
        submitter: Arc<RetryingSubmitter>,
        submit_endpoint: &str,
        config: SchedulerConfig,
        shutdown: CancellationToken,
    ) -> Arc<Self> {
        Arc::new(Self {
            node_id: node_id.to_string(),
            queue: Mutex::new(VecDeque::new()),
            active: DashMap::new(),
            failed: DashMap::new(),
            inference,
            committee,
            submitter,
            submit_endpoint: submit_endpoint.to_string(),
            config,
            shutdown,
        })
    }

    /// Accepts a task into the local queue. Repeated polls of the sequencer
    /// return the same assignment until it completes, so tasks already active
    /// or terminally failed are skipped. Returns whether it was accepted.
    pub async fn enqueue(&self, task: LocalTask) -> bool {
        if self.active.contains_key(&task.task_id) || self.failed.contains_key(&task.task_id) {
            return false;
        }
        self.active.insert(task.task_id.clone(), task.clone());
        self.queue.lock().await.push_back(task);
        true
    }

    /// Creates and enqueues a locally-originated task, returning its id.
    pub async fn submit_local(&self, model_id: &str, input: &str) -> String {
        let task = LocalTask::new(&uuid::Uuid::new_v4().to_string(), model_id, input);
        let task_id = task.task_id.clone();
        self.enqueue(task).await;
        tracing::info!("Task {} submitted to local queue", task_id);
        task_id
    }

    /// Spawns the worker pool and returns immediately.
    pub async fn start(self: Arc<Self>) {
        tracing::info!("Starting {} scheduler workers", self.config.workers);
        for worker_id in 0..self.config.workers {
            let scheduler = self.clone();
            tokio::spawn(async move {
                scheduler.worker_loop(worker_id).await;
            });
        }
    }

    async fn worker_loop(&self, worker_id: usize) {
        tracing::info!("Scheduler worker {} started", worker_id);

        loop {
            if self.shutdown.is_cancelled() {
                tracing::info!("Scheduler worker {} stopped", worker_id);
                break;
            }

            let task = self.queue.lock().await.pop_front();
            match task {
                Some(mut task) => self.process(worker_id, &mut task).await,
                None => {
                    tokio::select! {
                        _ = self.shutdown.cancelled() => {}
                        _ = tokio::time::sleep(self.config.idle_poll) => {}
                    }
                }
            }
        }
    }

    /// One whole-task attempt, plus the retry/park decision.
    async fn process(&self, worker_id: usize, task: &mut LocalTask) {
        task.mark_attempt();
        tracing::info!(
            "Worker {} processing task {} (attempt {})",
            worker_id,
            task.task_id,
            task.retries
        );

        match self.attempt(task).await {
            Ok(()) => {
                self.active.remove(&task.task_id);
                tracing::info!("Task {} completed successfully", task.task_id);
            }
            Err(e) => {
                tracing::warn!("Error processing task {}: {}", task.task_id, e);
                if task.is_retryable(self.config.max_task_retries) {
                    self.active.insert(task.task_id.clone(), task.clone());
                    self.queue.lock().await.push_back(task.clone());
                } else {
                    self.active.remove(&task.task_id);
                    self.failed.insert(task.task_id.clone(), task.clone());
                    tracing::error!(
                        "Task {} permanently failed after {} retries",
                        task.task_id,
                        task.retries
                    );
                }
            }
        }
    }

    /// Execution, certification, and delivery for a single attempt.
    async fn attempt(&self, task: &LocalTask) -> anyhow::Result<()> {
        let output = (self.inference)(task.model_id.clone(), task.input.clone()).await?;

        let dacert = self
            .committee
            .sign_result(&task.task_id, &task.model_id, &output)?;

        let result = serde_json::json!({
            "model_id": task.model_id,
            "input": task.input,
            "output": output,
        });
        let payload = serde_json::json!({
            "task_id": task.task_id,
            "node_id": self.node_id,
            "result": result,
            "dacert": dacert,
        });

        if self.submitter.submit(&self.submit_endpoint, &payload).await {
            Ok(())
        } else {
            Err(anyhow::anyhow!("result submission failed"))
        }
    }

    // --- Introspection ---

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub async fn queue_len(&self) -> usize {
        self.queue.lock().await.len()
    }

    pub fn failed_tasks(&self) -> Vec<LocalTask> {
        self.failed
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}
