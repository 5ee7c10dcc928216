//! Node Selection Policies
//!
//! A policy picks one node out of the compatible set computed by the router.
//! Policies own whatever cursor state they need; the router never mutates a
//! bare shared counter.

use std::sync::atomic::{AtomicUsize, Ordering};

pub trait SelectionPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Picks a node from `candidates`, or `None` when the set is empty.
    /// `candidates` arrive in a stable order (sorted by node id).
    fn select(&self, candidates: &[String]) -> Option<String>;
}

/// Default policy: cycles through the compatible set with a process-wide
/// cursor that advances by one on every selection and wraps modulo the set
/// size, so repeated calls over a stable set are deterministic and fair.
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self {
            cursor: AtomicUsize::new(0),
        }
    }
}

impl Default for RoundRobin {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionPolicy for RoundRobin {
    fn name(&self) -> &'static str {
        "round_robin"
    }

    fn select(&self, candidates: &[String]) -> Option<String> {
        if candidates.is_empty() {
            return None;
        }
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % candidates.len();
        Some(candidates[idx].clone())
    }
}

/// Latency-aware selection is a documented extension point; until nodes
/// report latency samples this picks the first compatible node.
pub struct LowestLatency;

impl SelectionPolicy for LowestLatency {
    fn name(&self) -> &'static str {
        "lowest_latency"
    }

    fn select(&self, candidates: &[String]) -> Option<String> {
        candidates.first().cloned()
    }
}
