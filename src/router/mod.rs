//! Task Router Module
//!
//! The assignment layer over the registry's state. Matches tasks to
//! registered nodes that advertise the right model capability and have been
//! seen within the liveness window, distributes load through a pluggable
//! selection policy, and periodically reassigns work that has been sitting
//! Assigned past the staleness threshold.
//!
//! ## Responsibilities
//! - **Compatibility matching**: capability and liveness filtering.
//! - **Selection policy**: round-robin by default, injectable for tests and
//!   future latency-aware strategies.
//! - **Stale sweep**: the cooperative timeout mechanism for workers that died
//!   silently mid-task.

pub mod policy;
pub mod service;

mod tests;

pub use policy::{LowestLatency, RoundRobin, SelectionPolicy};
pub use service::{RouterConfig, TaskRouter};
