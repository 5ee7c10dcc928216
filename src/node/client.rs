//! Sequencer API Client
//!
//! Thin reqwest wrapper over the sequencer's node-facing endpoints. Polling
//! failures are soft (logged, `None`) so a transient sequencer outage never
//! kills the runtime loop; registration failures are surfaced so boot can
//! retry deliberately.

use crate::registry::protocol::{
    AckResponse, RegisterNodeRequest, TaskView, ENDPOINT_GET_TASK, ENDPOINT_NODE_STATUS,
    ENDPOINT_REGISTER_NODE,
};
use crate::registry::types::NodeRecord;

use anyhow::Result;
use std::time::Duration;

pub struct NodeClient {
    http: reqwest::Client,
    base_url: String,
}

impl NodeClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Registers the node with the sequencer. Returns whether the sequencer
    /// acknowledged.
    pub async fn register(
        &self,
        node_id: &str,
        capabilities: &[String],
        public_key: &str,
    ) -> Result<bool> {
        let payload = RegisterNodeRequest {
            node_id: node_id.to_string(),
            capabilities: capabilities.to_vec(),
            public_key: public_key.to_string(),
        };

        let response = self
            .http
            .post(format!("{}{}", self.base_url, ENDPOINT_REGISTER_NODE))
            .json(&payload)
            .timeout(Duration::from_secs(5))
            .send()
            .await?;

        if response.status().is_success() {
            let ack: AckResponse = response.json().await?;
            tracing::info!("Node registered successfully: {}", ack.message);
            Ok(true)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Registration failed: {} - {}", status, body);
            Ok(false)
        }
    }

    /// Polls the sequencer for a task assigned to this node.
    pub async fn fetch_task(&self, node_id: &str) -> Option<TaskView> {
        let url = format!("{}{}/{}", self.base_url, ENDPOINT_GET_TASK, node_id);
        let response = match self
            .http
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("Failed to fetch task: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!("Task fetch returned status {}", response.status());
            return None;
        }

        match response.json::<Option<TaskView>>().await {
            Ok(task) => task,
            Err(e) => {
                tracing::warn!("Failed to decode task response: {}", e);
                None
            }
        }
    }

    /// Reads this node's record back from the sequencer.
    pub async fn node_status(&self, node_id: &str) -> Result<NodeRecord> {
        let url = format!("{}{}/{}", self.base_url, ENDPOINT_NODE_STATUS, node_id);
        let response = self
            .http
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("node status request failed: {}", response.status());
        }
        Ok(response.json().await?)
    }
}
