//! PARALLAX Inference Coordination Cluster Library
//!
//! This library crate defines the core modules of the attested-inference
//! coordination system. It serves as the foundation for the sequencer binary
//! (`main.rs`).
//!
//! ## Architecture Modules
//! The system is composed of six loosely coupled subsystems:
//!
//! - **`registry`**: The authoritative sequencer state. Stores registered worker
//!   nodes and the task table, and owns the single commit point where a result
//!   plus its DACert is accepted.
//! - **`router`**: The assignment layer. Matches tasks to capable, live nodes
//!   using a pluggable selection policy and periodically reassigns stale work.
//! - **`scheduler`**: The node-local execution engine. A bounded worker pool
//!   that runs inference through an injected collaborator and delivers results
//!   with bounded retry.
//! - **`committee`**: The attestation layer. A fixed validator committee that
//!   quorum-signs result hashes into DACerts and verifies them.
//! - **`models`**: The AI model catalog served to clients and operators.
//! - **`node`**: The worker-node side. HTTP client for the sequencer API and
//!   the polling runtime that feeds the local scheduler.

pub mod committee;
pub mod error;
pub mod models;
pub mod node;
pub mod registry;
pub mod router;
pub mod scheduler;
