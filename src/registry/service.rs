//! Sequencer Registry Service
//!
//! Owns the node and task tables. Both are `DashMap`s; per-entry guards are
//! the mutual-exclusion scope required by the state machine, so two different
//! tasks never contend and the same task is never concurrently completed and
//! reassigned. DACert verification is pure and runs before any entry guard is
//! taken.

use super::types::{now_ms, CompletedResult, NodeRecord, TaskId, TaskRecord, TaskStatus};
use crate::committee::signer::Committee;
use crate::committee::types::DaCert;
use crate::error::ClusterError;

use dashmap::DashMap;
use std::sync::Arc;

/// Registry tunables.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum accepted task input length in bytes.
    pub max_input_len: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_input_len: 1000,
        }
    }
}

/// Outcome of a result submission at the commit point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// First valid delivery; the task transitioned to Completed.
    Stored,
    /// The task was already Completed. Nothing was changed.
    Duplicate,
}

/// The central, authoritative store of cluster state.
pub struct SequencerRegistry {
    /// Node table: `node_id -> NodeRecord`.
    pub nodes: DashMap<String, NodeRecord>,
    /// Task table: `task_id -> TaskRecord`. Completed tasks stay here with
    /// their stored result; the pending set is everything non-terminal.
    pub tasks: DashMap<TaskId, TaskRecord>,
    committee: Arc<Committee>,
    config: RegistryConfig,
}

impl SequencerRegistry {
    pub fn new(committee: Arc<Committee>, config: RegistryConfig) -> Arc<Self> {
        Arc::new(Self {
            nodes: DashMap::new(),
            tasks: DashMap::new(),
            committee,
            config,
        })
    }

    /// Upserts a node record, refreshing `last_seen`. Idempotent.
    pub fn register_node(
        &self,
        node_id: &str,
        capabilities: Vec<String>,
        public_key: &str,
    ) -> Result<(), ClusterError> {
        if node_id.is_empty() {
            return Err(ClusterError::Validation("node_id is required".to_string()));
        }
        if capabilities.is_empty() {
            return Err(ClusterError::Validation(
                "capabilities must not be empty".to_string(),
            ));
        }

        let now = now_ms();
        self.nodes.insert(
            node_id.to_string(),
            NodeRecord {
                node_id: node_id.to_string(),
                capabilities,
                public_key: public_key.to_string(),
                registered_at: now,
                last_seen: now,
            },
        );

        tracing::info!("Node registered: {}", node_id);
        Ok(())
    }

    /// Refreshes a node's `last_seen`. Returns false for unknown nodes.
    pub fn touch_node(&self, node_id: &str) -> bool {
        match self.nodes.get_mut(node_id) {
            Some(mut node) => {
                node.last_seen = now_ms();
                true
            }
            None => false,
        }
    }

    /// Validates and stores a new Queued task, returning its id.
    pub fn submit_task(&self, model_id: &str, input: &str) -> Result<TaskId, ClusterError> {
        if model_id.is_empty() || input.is_empty() {
            return Err(ClusterError::Validation(
                "model_id and input are required".to_string(),
            ));
        }
        if input.len() > self.config.max_input_len {
            return Err(ClusterError::Validation(format!(
                "input exceeds maximum length of {} bytes",
                self.config.max_input_len
            )));
        }

        let task = TaskRecord::queued(model_id, input);
        let task_id = task.task_id.clone();
        self.tasks.insert(task_id.clone(), task);

        tracing::info!("Task submitted: {} (model {})", task_id, model_id);
        Ok(task_id)
    }

    /// Returns the task currently assigned to `node_id`, if any, refreshing
    /// the node's `last_seen` as a liveness signal.
    pub fn get_task_for_node(&self, node_id: &str) -> Result<Option<TaskRecord>, ClusterError> {
        if !self.touch_node(node_id) {
            return Err(ClusterError::NotFound(format!("node {}", node_id)));
        }

        let task = self
            .tasks
            .iter()
            .find(|entry| {
                entry.value().status == TaskStatus::Assigned
                    && entry.value().assigned_node.as_deref() == Some(node_id)
            })
            .map(|entry| entry.value().clone());

        Ok(task)
    }

    /// The single commit point for results.
    ///
    /// Verification of the certificate is pure and happens before the task's
    /// entry guard is taken; the status check and mutation then run under the
    /// guard, atomically with respect to concurrent reassignment sweeps.
    ///
    /// A delivery for an already-Completed task is an explicit no-op
    /// (`Duplicate`) so retried transports stay idempotent. A delivery from a
    /// node that is no longer the current assignee is fenced off with
    /// `StaleAssignment`.
    pub fn submit_result(
        &self,
        task_id: &TaskId,
        node_id: &str,
        result: serde_json::Value,
        dacert: DaCert,
    ) -> Result<SubmitOutcome, ClusterError> {
        if !self.tasks.contains_key(task_id) {
            return Err(ClusterError::NotFound(format!("task {}", task_id)));
        }

        if dacert.cert_payload.task_id != task_id.0 {
            return Err(ClusterError::Signature(format!(
                "DACert task id mismatch: payload carries {}",
                dacert.cert_payload.task_id
            )));
        }
        if !self.committee.verify_dacert(&dacert) {
            return Err(ClusterError::Signature(
                "DACert failed quorum verification".to_string(),
            ));
        }

        self.touch_node(node_id);

        let mut entry = self
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| ClusterError::NotFound(format!("task {}", task_id)))?;

        if entry.status == TaskStatus::Completed {
            tracing::info!("Duplicate result for completed task {} ignored", task_id);
            return Ok(SubmitOutcome::Duplicate);
        }

        if entry.assigned_node.as_deref() != Some(node_id) {
            tracing::warn!(
                "Rejected result for task {} from {}: current assignee is {:?}",
                task_id,
                node_id,
                entry.assigned_node
            );
            return Err(ClusterError::StaleAssignment {
                task_id: task_id.0.clone(),
                node_id: node_id.to_string(),
            });
        }

        entry.status = TaskStatus::Completed;
        entry.assigned_node = None;
        entry.completion = Some(CompletedResult {
            result,
            dacert,
            completed_at: now_ms(),
        });

        tracing::info!("Task {} result stored (submitted by {})", task_id, node_id);
        Ok(SubmitOutcome::Stored)
    }

    pub fn node_status(&self, node_id: &str) -> Result<NodeRecord, ClusterError> {
        self.nodes
            .get(node_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ClusterError::NotFound(format!("node {}", node_id)))
    }

    pub fn get_task(&self, task_id: &TaskId) -> Option<TaskRecord> {
        self.tasks.get(task_id).map(|entry| entry.value().clone())
    }

    // --- Admin projections ---

    pub fn list_nodes(&self) -> Vec<NodeRecord> {
        let mut nodes: Vec<NodeRecord> = self
            .nodes
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        nodes.sort_by(|a, b| a.node_id.cmp(&b.node_id));
        nodes
    }

    pub fn pending_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|entry| entry.value().is_pending())
            .count()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|entry| entry.value().status == TaskStatus::Completed)
            .count()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
