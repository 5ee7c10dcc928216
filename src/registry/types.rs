use crate::committee::types::DaCert;
use serde::{Deserialize, Serialize};

/// Unique identifier for a task, generated at submission.
///
/// Wrapper around a UUID string so ids are globally unique across sequencer
/// restarts and independent submitters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TaskId(pub String);

impl TaskId {
    /// Generates a new random UUID v4-based TaskId.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered worker node as seen by the sequencer.
///
/// Nodes are never deleted; a node that stops polling simply ages out of the
/// router's liveness window via `last_seen`. Re-registration replaces the
/// whole record, so a capability change requires registering again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub node_id: String,
    /// Model identifiers this node can execute. Immutable after registration.
    pub capabilities: Vec<String>,
    /// Published verification key, reserved for message authentication.
    pub public_key: String,
    /// Timestamp (ms) of the registration call that created this record.
    pub registered_at: u64,
    /// Timestamp (ms) of the last request that carried this node's id.
    pub last_seen: u64,
}

/// Lifecycle state of a task in the registry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskStatus {
    /// Submitted but not yet matched to a node.
    Queued,
    /// Handed to exactly one node; `assigned_node` and `assigned_at` are set.
    Assigned,
    /// A quorum-certified result was accepted. Terminal.
    Completed,
    /// Marked failed by an operator or scheduler escalation. Terminal.
    Failed,
}

/// The accepted result of a completed task, stored alongside its certificate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedResult {
    pub result: serde_json::Value,
    pub dacert: DaCert,
    pub completed_at: u64,
}

/// A task and its mutable assignment state.
///
/// Invariants: `assigned_node` is `Some` iff `status == Assigned`; a task is
/// assigned to at most one node at any instant; `completion` is `Some` iff
/// `status == Completed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task_id: TaskId,
    pub model_id: String,
    pub input: String,
    pub status: TaskStatus,
    pub assigned_node: Option<String>,
    pub created_at: u64,
    pub assigned_at: Option<u64>,
    /// How many times a staleness sweep moved this task to a new node.
    pub reassign_count: u32,
    pub completion: Option<CompletedResult>,
}

impl TaskRecord {
    pub fn queued(model_id: &str, input: &str) -> Self {
        Self {
            task_id: TaskId::new(),
            model_id: model_id.to_string(),
            input: input.to_string(),
            status: TaskStatus::Queued,
            assigned_node: None,
            created_at: now_ms(),
            assigned_at: None,
            reassign_count: 0,
            completion: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.status, TaskStatus::Queued | TaskStatus::Assigned)
    }
}

/// Helper to get the current system time in milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}
