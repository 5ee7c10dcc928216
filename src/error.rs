//! Cluster Error Taxonomy
//!
//! Typed errors shared by the registry, router, and scheduler. Each variant
//! maps to an HTTP status so axum handlers can return errors directly.
//!
//! Routing misses are deliberately *not* an error (a task simply stays
//! queued), and transport failures are surfaced by the retrying submitter as
//! a boolean, so neither appears here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClusterError {
    /// Malformed submission: missing field, wrong type, oversized input.
    /// Never retried.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Unknown task or node id.
    #[error("not found: {0}")]
    NotFound(String),

    /// A result arrived from a node that is no longer the task's current
    /// assignee (the task was reassigned after a staleness sweep).
    #[error("stale assignment: task {task_id} is not assigned to node {node_id}")]
    StaleAssignment { task_id: String, node_id: String },

    /// DACert payload mismatch or quorum not met.
    #[error("signature rejected: {0}")]
    Signature(String),
}

impl ClusterError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ClusterError::Validation(_) => StatusCode::BAD_REQUEST,
            ClusterError::NotFound(_) => StatusCode::NOT_FOUND,
            ClusterError::StaleAssignment { .. } => StatusCode::CONFLICT,
            ClusterError::Signature(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ClusterError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
