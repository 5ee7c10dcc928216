//! Node Runtime
//!
//! The lifecycle loop of one worker node: register with the sequencer (with
//! bounded retry), then poll for assigned work on an interval and hand it to
//! the local scheduler. The scheduler deduplicates repeated polls of the same
//! assignment, so the loop stays simple. Shutdown is cooperative through the
//! shared cancellation token.

use super::client::NodeClient;
use crate::scheduler::scheduler::TaskScheduler;
use crate::scheduler::types::LocalTask;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct NodeRuntimeConfig {
    pub poll_interval: Duration,
    pub register_attempts: u32,
    pub register_retry_delay: Duration,
}

impl Default for NodeRuntimeConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            register_attempts: 3,
            register_retry_delay: Duration::from_secs(1),
        }
    }
}

pub struct NodeRuntime {
    node_id: String,
    capabilities: Vec<String>,
    public_key: String,
    client: NodeClient,
    scheduler: Arc<TaskScheduler>,
    config: NodeRuntimeConfig,
    shutdown: CancellationToken,
}

impl NodeRuntime {
    pub fn new(
        node_id: &str,
        capabilities: Vec<String>,
        public_key: &str,
        client: NodeClient,
        scheduler: Arc<TaskScheduler>,
        config: NodeRuntimeConfig,
        shutdown: CancellationToken,
    ) -> Arc<Self> {
        Arc::new(Self {
            node_id: node_id.to_string(),
            capabilities,
            public_key: public_key.to_string(),
            client,
            scheduler,
            config,
            shutdown,
        })
    }

    /// Registers and then polls until cancellation. Fails only if
    /// registration never succeeds within its attempt budget.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        tracing::info!("Booting PARALLAX node {}", self.node_id);
        self.register_with_retry().await?;
        tracing::info!("Registration successful, entering task loop");

        self.scheduler.clone().start().await;

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Node {} runtime stopped", self.node_id);
                    return Ok(());
                }
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }

            if let Some(view) = self.client.fetch_task(&self.node_id).await {
                let task = LocalTask::from(&view);
                if self.scheduler.enqueue(task).await {
                    tracing::info!("Fetched task {} for execution", view.task_id);
                }
            }
        }
    }

    pub fn spawn(self: Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }

    async fn register_with_retry(&self) -> Result<()> {
        for attempt in 1..=self.config.register_attempts {
            match self
                .client
                .register(&self.node_id, &self.capabilities, &self.public_key)
                .await
            {
                Ok(true) => return Ok(()),
                Ok(false) => {
                    tracing::warn!("Registration attempt {} rejected", attempt);
                }
                Err(e) => {
                    tracing::warn!("Registration attempt {} failed: {}", attempt, e);
                }
            }
            if attempt < self.config.register_attempts {
                tokio::time::sleep(self.config.register_retry_delay).await;
            }
        }
        anyhow::bail!(
            "node {} could not register after {} attempts",
            self.node_id,
            self.config.register_attempts
        )
    }
}
