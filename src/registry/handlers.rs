//! Sequencer HTTP Handlers
//!
//! The axum surface over the registry, router, batch dispatcher, and model
//! catalog. Domain errors convert straight into HTTP responses through
//! `ClusterError::into_response`.

use super::protocol::*;
use super::service::{SequencerRegistry, SubmitOutcome};
use crate::error::ClusterError;
use crate::models::catalog::{ModelCatalog, ModelInfo};
use crate::router::service::TaskRouter;
use crate::scheduler::batch::{dispatch_batch, BatchSummary};

use axum::extract::Path;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use std::sync::Arc;

/// Builds the sequencer's HTTP application. Shared by `main` and the
/// end-to-end tests.
pub fn build_app(
    registry: Arc<SequencerRegistry>,
    router: Arc<TaskRouter>,
    catalog: Arc<ModelCatalog>,
) -> Router {
    Router::new()
        .route(ENDPOINT_REGISTER_NODE, post(handle_register_node))
        .route(ENDPOINT_SUBMIT_TASK, post(handle_submit_task))
        .route(ENDPOINT_ENQUEUE, post(handle_enqueue))
        .route(ENDPOINT_SUBMIT_BATCH, post(handle_submit_batch))
        .route(&format!("{}/:node_id", ENDPOINT_GET_TASK), get(handle_get_task))
        .route(ENDPOINT_SUBMIT_RESULT, post(handle_submit_result))
        .route(
            &format!("{}/:node_id", ENDPOINT_NODE_STATUS),
            get(handle_node_status),
        )
        .route(ENDPOINT_STATUS, get(handle_status))
        .route(ENDPOINT_MODELS, get(handle_models))
        .layer(Extension(registry))
        .layer(Extension(router))
        .layer(Extension(catalog))
}

pub async fn handle_register_node(
    Extension(registry): Extension<Arc<SequencerRegistry>>,
    Json(req): Json<RegisterNodeRequest>,
) -> Result<Json<AckResponse>, ClusterError> {
    registry.register_node(&req.node_id, req.capabilities, &req.public_key)?;
    Ok(Json(AckResponse::ok("Node registered")))
}

pub async fn handle_submit_task(
    Extension(registry): Extension<Arc<SequencerRegistry>>,
    Json(req): Json<SubmitTaskRequest>,
) -> Result<Json<SubmitTaskResponse>, ClusterError> {
    let task_id = registry.submit_task(&req.model_id, &req.input)?;
    Ok(Json(SubmitTaskResponse {
        status: "queued".to_string(),
        task_id,
    }))
}

pub async fn handle_enqueue(
    Extension(router): Extension<Arc<TaskRouter>>,
    Json(req): Json<EnqueueRequest>,
) -> Result<Json<EnqueueResponse>, ClusterError> {
    let outcome = router.enqueue_task(&req.model_id, &req.input)?;
    let status = if outcome.assigned_to.is_some() {
        "assigned"
    } else {
        "queued"
    };
    Ok(Json(EnqueueResponse {
        task_id: outcome.task_id,
        status: status.to_string(),
        assigned_to: outcome.assigned_to,
    }))
}

pub async fn handle_submit_batch(
    Extension(router): Extension<Arc<TaskRouter>>,
    Json(batch): Json<Vec<serde_json::Value>>,
) -> Json<BatchSummary> {
    Json(dispatch_batch(&router, &batch))
}

pub async fn handle_get_task(
    Extension(registry): Extension<Arc<SequencerRegistry>>,
    Path(node_id): Path<String>,
) -> Result<Json<Option<TaskView>>, ClusterError> {
    let task = registry.get_task_for_node(&node_id)?;
    Ok(Json(task.as_ref().map(TaskView::from)))
}

pub async fn handle_submit_result(
    Extension(registry): Extension<Arc<SequencerRegistry>>,
    Json(req): Json<SubmitResultRequest>,
) -> Result<Json<AckResponse>, ClusterError> {
    let outcome = registry.submit_result(&req.task_id, &req.node_id, req.result, req.dacert)?;
    let message = match outcome {
        SubmitOutcome::Stored => "Result submitted",
        SubmitOutcome::Duplicate => "Task already completed; duplicate ignored",
    };
    Ok(Json(AckResponse::ok(message)))
}

pub async fn handle_node_status(
    Extension(registry): Extension<Arc<SequencerRegistry>>,
    Path(node_id): Path<String>,
) -> Result<Json<crate::registry::types::NodeRecord>, ClusterError> {
    Ok(Json(registry.node_status(&node_id)?))
}

pub async fn handle_status(
    Extension(registry): Extension<Arc<SequencerRegistry>>,
) -> Json<ClusterStatusResponse> {
    Json(ClusterStatusResponse {
        registered_nodes: registry.node_count(),
        pending_tasks: registry.pending_count(),
        completed_tasks: registry.completed_count(),
    })
}

#[derive(serde::Serialize)]
pub struct ModelsResponse {
    pub available_models: Vec<ModelInfo>,
}

pub async fn handle_models(
    Extension(catalog): Extension<Arc<ModelCatalog>>,
) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        available_models: catalog.list(),
    })
}
