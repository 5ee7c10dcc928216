//! Task Router Service
//!
//! Operates over the registry's tables. Assignment mutations run under the
//! task's DashMap entry guard, so an assignment attempt can never interleave
//! with result acceptance on the same task. Completed tasks are never touched
//! again.

use crate::error::ClusterError;
use crate::registry::service::SequencerRegistry;
use crate::registry::types::{now_ms, TaskId, TaskStatus};
use crate::router::policy::SelectionPolicy;

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Router tunables.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Maximum age of a node's `last_seen` (ms) for it to receive work.
    pub liveness_window_ms: u64,
    /// Age of an unfinished assignment (ms) past which it is reassigned.
    pub staleness_ms: u64,
    /// How often the background sweep runs.
    pub sweep_interval: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            liveness_window_ms: 60_000,
            staleness_ms: 30_000,
            sweep_interval: Duration::from_secs(10),
        }
    }
}

/// Outcome of `enqueue_task`: created, and possibly already assigned.
#[derive(Debug, Clone)]
pub struct EnqueueOutcome {
    pub task_id: TaskId,
    pub assigned_to: Option<String>,
}

pub struct TaskRouter {
    registry: Arc<SequencerRegistry>,
    policy: Box<dyn SelectionPolicy>,
    config: RouterConfig,
}

impl TaskRouter {
    pub fn new(
        registry: Arc<SequencerRegistry>,
        policy: Box<dyn SelectionPolicy>,
        config: RouterConfig,
    ) -> Arc<Self> {
        tracing::info!("Task router using '{}' selection policy", policy.name());
        Arc::new(Self {
            registry,
            policy,
            config,
        })
    }

    /// Selects a registered, live node whose capabilities include `model_id`.
    ///
    /// Returns `None` (a routing miss, not an error) when the compatible set
    /// is empty. Candidates are sorted by node id so the round-robin cursor
    /// cycles deterministically over a stable set.
    pub fn find_compatible_node(&self, model_id: &str) -> Option<String> {
        let now = now_ms();
        let mut candidates: Vec<String> = self
            .registry
            .nodes
            .iter()
            .filter(|entry| {
                let node = entry.value();
                node.capabilities.iter().any(|m| m == model_id)
                    && now.saturating_sub(node.last_seen) < self.config.liveness_window_ms
            })
            .map(|entry| entry.key().clone())
            .collect();

        if candidates.is_empty() {
            tracing::warn!("Routing miss: no compatible live node for model {}", model_id);
            return None;
        }

        candidates.sort();
        self.policy.select(&candidates)
    }

    /// Assigns a task to a compatible node, exclusive per task.
    ///
    /// Selection happens first (read-only); the status mutation then runs
    /// under the task's entry guard. A task that turned Completed in between
    /// is left untouched.
    pub fn assign_task_to_node(&self, task_id: &TaskId) -> Option<String> {
        let model_id = {
            let entry = self.registry.tasks.get(task_id)?;
            if entry.status == TaskStatus::Completed || entry.status == TaskStatus::Failed {
                return None;
            }
            entry.model_id.clone()
        };

        let node_id = self.find_compatible_node(&model_id)?;

        let mut entry = self.registry.tasks.get_mut(task_id)?;
        if entry.status == TaskStatus::Completed || entry.status == TaskStatus::Failed {
            return None;
        }
        if entry.status == TaskStatus::Assigned {
            entry.reassign_count += 1;
        }
        entry.status = TaskStatus::Assigned;
        entry.assigned_node = Some(node_id.clone());
        entry.assigned_at = Some(now_ms());

        tracing::info!("Routed task {} to node {}", task_id, node_id);
        Some(node_id)
    }

    /// Creates a task through the registry and immediately attempts to
    /// assign it.
    pub fn enqueue_task(&self, model_id: &str, input: &str) -> Result<EnqueueOutcome, ClusterError> {
        let task_id = self.registry.submit_task(model_id, input)?;
        let assigned_to = self.assign_task_to_node(&task_id);
        Ok(EnqueueOutcome {
            task_id,
            assigned_to,
        })
    }

    /// Scans for tasks that need a node and assigns them: Assigned tasks
    /// older than the staleness threshold, plus the Queued backlog (routing
    /// misses and tasks reverted by an earlier sweep). Returns how many were
    /// successfully handed to a node.
    ///
    /// This sweep is the cluster's only timeout mechanism: it is cooperative,
    /// so a slow-but-alive worker may lose its assignment and must have its
    /// late result fenced off by the registry. When no compatible live node
    /// exists a stale task reverts to Queued and stays visible to every
    /// subsequent sweep.
    pub fn reassign_stale_tasks(&self) -> usize {
        self.reassign_stale_tasks_at(now_ms())
    }

    /// Sweep with an explicit clock, used directly by tests.
    pub fn reassign_stale_tasks_at(&self, now: u64) -> usize {
        let candidates: Vec<(TaskId, bool)> = self
            .registry
            .tasks
            .iter()
            .filter_map(|entry| {
                let task = entry.value();
                match task.status {
                    TaskStatus::Queued => Some((entry.key().clone(), false)),
                    TaskStatus::Assigned
                        if task
                            .assigned_at
                            .map(|t| now.saturating_sub(t) > self.config.staleness_ms)
                            .unwrap_or(false) =>
                    {
                        Some((entry.key().clone(), true))
                    }
                    _ => None,
                }
            })
            .collect();

        let mut assigned = 0;
        for (task_id, was_stale) in candidates {
            if was_stale {
                tracing::info!("Reassigning stale task {}", task_id);
            }
            match self.assign_task_to_node(&task_id) {
                Some(_) => assigned += 1,
                None if was_stale => self.revert_to_queued(&task_id),
                None => {}
            }
        }
        assigned
    }

    /// Clears a dead assignment so the task becomes visible to future
    /// assignment attempts, preserving the `assigned_node ⇔ Assigned`
    /// invariant.
    fn revert_to_queued(&self, task_id: &TaskId) {
        if let Some(mut entry) = self.registry.tasks.get_mut(task_id) {
            if entry.status == TaskStatus::Assigned {
                entry.status = TaskStatus::Queued;
                entry.assigned_node = None;
                entry.assigned_at = None;
                tracing::warn!("Task {} reverted to queued: no compatible live node", task_id);
            }
        }
    }

    /// Runs the periodic staleness sweep until cancellation.
    pub fn spawn_sweeper(self: Arc<Self>, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
        let interval = self.config.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::info!("Staleness sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let count = self.reassign_stale_tasks();
                        if count > 0 {
                            tracing::info!("Staleness sweep reassigned {} task(s)", count);
                        }
                    }
                }
            }
        })
    }
}
