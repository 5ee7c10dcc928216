//! AI Model Catalog Module
//!
//! Operator-facing catalog of the models the cluster knows how to route.
//! Purely descriptive: the router matches on node capabilities, not on this
//! catalog, so an unknown model id still enqueues (and stays queued until a
//! node advertising it registers).

pub mod catalog;


pub use catalog::{ModelCatalog, ModelInfo};
