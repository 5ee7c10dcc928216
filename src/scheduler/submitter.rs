//! Retrying Submitter
//!
//! Wraps a single network delivery in bounded retry with pure exponential
//! backoff: the delay before attempt k+1 is `initial_delay * 2^k`, no jitter,
//! so the sequence is deterministic under a paused test clock. Non-2xx
//! statuses and transport errors are equally retryable; exhausting the
//! ceiling returns `false` rather than an error, and the caller decides what
//! "permanently failed" means.
//!
//! The backoff sleep blocks only the calling worker and holds no shared lock.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// One delivery attempt: `(endpoint, payload) -> HTTP status`.
/// Injectable so tests can drive deterministic failure sequences.
pub type TransportFn = Arc<
    dyn Fn(String, serde_json::Value) -> Pin<Box<dyn Future<Output = anyhow::Result<u16>> + Send>>
        + Send
        + Sync,
>;

#[derive(Debug, Clone)]
pub struct SubmitterConfig {
    pub max_retries: u32,
    pub initial_delay: Duration,
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_secs(2),
        }
    }
}

pub struct RetryingSubmitter {
    transport: TransportFn,
    config: SubmitterConfig,
}

impl RetryingSubmitter {
    /// Production transport: JSON POST via reqwest with a request timeout.
    pub fn over_http(client: reqwest::Client, config: SubmitterConfig) -> Arc<Self> {
        let transport: TransportFn = Arc::new(move |url, payload| {
            let client = client.clone();
            Box::pin(async move {
                let response = client
                    .post(&url)
                    .json(&payload)
                    .timeout(Duration::from_secs(10))
                    .send()
                    .await?;
                Ok(response.status().as_u16())
            })
        });
        Arc::new(Self { transport, config })
    }

    pub fn with_transport(transport: TransportFn, config: SubmitterConfig) -> Arc<Self> {
        Arc::new(Self { transport, config })
    }

    /// Delivers `payload` to `endpoint`, retrying with backoff up to the
    /// configured ceiling. Returns whether any attempt got a 2xx back.
    pub async fn submit(&self, endpoint: &str, payload: &serde_json::Value) -> bool {
        let mut delay = self.config.initial_delay;

        for attempt in 0..self.config.max_retries {
            match (self.transport)(endpoint.to_string(), payload.clone()).await {
                Ok(status) if (200..300).contains(&status) => {
                    tracing::info!("Result submitted on attempt {}", attempt + 1);
                    return true;
                }
                Ok(status) => {
                    tracing::warn!("Attempt {} failed with status {}", attempt + 1, status);
                }
                Err(e) => {
                    tracing::warn!("Attempt {} raised transport error: {}", attempt + 1, e);
                }
            }

            // No sleep after the final attempt.
            if attempt + 1 == self.config.max_retries {
                break;
            }
            tracing::debug!("Retrying in {:?}", delay);
            tokio::time::sleep(delay).await;
            delay *= 2;
        }

        tracing::error!(
            "Submission to {} failed after {} attempts",
            endpoint,
            self.config.max_retries
        );
        false
    }
}
