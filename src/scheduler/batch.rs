//! Batch Dispatcher
//!
//! Validates and enqueues a batch of raw task entries in one call. Entries
//! arrive as untyped JSON so malformed shapes (missing fields, wrong types)
//! are rejected per entry with a reason instead of failing the whole batch.
//! Oversized batches are truncated to the first `MAX_TASKS_PER_BATCH`
//! entries before processing.

use crate::registry::types::now_ms;
use crate::router::service::TaskRouter;

use serde::{Deserialize, Serialize};

pub const MAX_TASKS_PER_BATCH: usize = 100;
const MAX_INPUT_LEN: usize = 1000;

#[derive(Debug, Serialize, Deserialize)]
pub struct RejectedEntry {
    pub entry_id: String,
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchSummary {
    pub timestamp: u64,
    pub accepted_count: usize,
    pub rejected_count: usize,
    pub accepted_ids: Vec<String>,
    pub rejected: Vec<RejectedEntry>,
}

/// Checks one raw entry, returning `(model_id, input)` or a rejection reason.
pub fn validate_task_payload(entry: &serde_json::Value) -> Result<(String, String), String> {
    let model_id = entry.get("model_id");
    let input = entry.get("input");

    let (model_id, input) = match (model_id, input) {
        (Some(model_id), Some(input)) => (model_id, input),
        _ => return Err("Missing required fields".to_string()),
    };

    let model_id = model_id
        .as_str()
        .ok_or_else(|| "Missing required fields".to_string())?;
    let input = input
        .as_str()
        .ok_or_else(|| "Input must be a string".to_string())?;

    if input.len() > MAX_INPUT_LEN {
        return Err("Input too long".to_string());
    }

    Ok((model_id.to_string(), input.to_string()))
}

/// Validates every entry and enqueues the accepted ones through the router.
pub fn dispatch_batch(router: &TaskRouter, batch: &[serde_json::Value]) -> BatchSummary {
    let batch = if batch.len() > MAX_TASKS_PER_BATCH {
        tracing::warn!(
            "Batch of {} exceeds maximum of {}; truncating",
            batch.len(),
            MAX_TASKS_PER_BATCH
        );
        &batch[..MAX_TASKS_PER_BATCH]
    } else {
        batch
    };

    tracing::info!("Dispatching batch of {} tasks", batch.len());

    let mut accepted_ids = Vec::new();
    let mut rejected = Vec::new();

    for entry in batch {
        match validate_task_payload(entry) {
            Ok((model_id, input)) => match router.enqueue_task(&model_id, &input) {
                Ok(outcome) => accepted_ids.push(outcome.task_id.0),
                Err(e) => rejected.push(RejectedEntry {
                    entry_id: uuid::Uuid::new_v4().to_string(),
                    reason: e.to_string(),
                }),
            },
            Err(reason) => {
                let entry_id = uuid::Uuid::new_v4().to_string();
                tracing::warn!("Rejected batch entry {}: {}", entry_id, reason);
                rejected.push(RejectedEntry { entry_id, reason });
            }
        }
    }

    let summary = BatchSummary {
        timestamp: now_ms(),
        accepted_count: accepted_ids.len(),
        rejected_count: rejected.len(),
        accepted_ids,
        rejected,
    };
    tracing::info!(
        "Batch dispatch complete: {} accepted, {} rejected",
        summary.accepted_count,
        summary.rejected_count
    );
    summary
}
