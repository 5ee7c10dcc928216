//! Sequencer Registry Module
//!
//! The authoritative store of worker nodes and tasks. All state mutation in
//! the cluster flows through the `SequencerRegistry`: node registration, task
//! submission, assignment bookkeeping, and the single commit point where a
//! result plus its DACert is accepted.
//!
//! ## Responsibilities
//! - **Node table**: registration upserts, `last_seen` refreshes, status reads.
//! - **Task table**: validated task creation and the Queued → Assigned →
//!   Completed state machine.
//! - **Result ingestion**: DACert verification, stale-assignment fencing, and
//!   idempotent handling of duplicate deliveries.
//! - **HTTP surface**: axum handlers and the wire DTOs for all of the above.

pub mod handlers;
pub mod protocol;
pub mod service;
pub mod types;
