//! Worker Node Module
//!
//! The node-facing side of the cluster: an HTTP client for the sequencer API
//! and the polling runtime that registers the node, fetches assigned work,
//! and feeds it into the local scheduler.

pub mod client;
pub mod runtime;


pub use client::NodeClient;
pub use runtime::{NodeRuntime, NodeRuntimeConfig};
