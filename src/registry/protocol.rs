//! Sequencer Wire Protocol
//!
//! Data Transfer Objects for the HTTP API between clients, worker nodes, and
//! the sequencer, plus the endpoint path constants shared by handlers and the
//! node-side client.

use super::types::{TaskId, TaskRecord};
use crate::committee::types::DaCert;
use serde::{Deserialize, Serialize};

pub const ENDPOINT_REGISTER_NODE: &str = "/register_node";
pub const ENDPOINT_SUBMIT_TASK: &str = "/submit_task";
pub const ENDPOINT_ENQUEUE: &str = "/enqueue";
pub const ENDPOINT_SUBMIT_BATCH: &str = "/submit_batch";
pub const ENDPOINT_GET_TASK: &str = "/get_task";
pub const ENDPOINT_SUBMIT_RESULT: &str = "/submit_result";
pub const ENDPOINT_NODE_STATUS: &str = "/node_status";
pub const ENDPOINT_STATUS: &str = "/status";
pub const ENDPOINT_MODELS: &str = "/models";

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterNodeRequest {
    pub node_id: String,
    pub capabilities: Vec<String>,
    pub public_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub status: String,
    pub message: String,
}

impl AckResponse {
    pub fn ok(message: &str) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitTaskRequest {
    pub model_id: String,
    pub input: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitTaskResponse {
    pub status: String,
    pub task_id: TaskId,
}

/// What a polling node needs to execute an assigned task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskView {
    pub task_id: TaskId,
    pub model_id: String,
    pub input: String,
    pub assigned_at: Option<u64>,
}

impl From<&TaskRecord> for TaskView {
    fn from(record: &TaskRecord) -> Self {
        Self {
            task_id: record.task_id.clone(),
            model_id: record.model_id.clone(),
            input: record.input.clone(),
            assigned_at: record.assigned_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResultRequest {
    pub task_id: TaskId,
    /// The submitting node, checked against the task's current assignee.
    pub node_id: String,
    pub result: serde_json::Value,
    pub dacert: DaCert,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClusterStatusResponse {
    pub registered_nodes: usize,
    pub pending_tasks: usize,
    pub completed_tasks: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnqueueRequest {
    pub model_id: String,
    pub input: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnqueueResponse {
    pub task_id: TaskId,
    /// "assigned" when a compatible node was found immediately, else "queued".
    pub status: String,
    pub assigned_to: Option<String>,
}
