//! Scheduler Module Tests
//!
//! Covers the deterministic backoff sequence, retry-ceiling exhaustion, the
//! two-level retry split between submitter and scheduler, local queue
//! deduplication, and batch validation rules.

#[cfg(test)]
mod tests {
    use crate::committee::signer::{first_m_selection, Committee};
    use crate::registry::service::{RegistryConfig, SequencerRegistry};
    use crate::router::policy::RoundRobin;
    use crate::router::service::{RouterConfig, TaskRouter};
    use crate::scheduler::batch::{dispatch_batch, validate_task_payload, MAX_TASKS_PER_BATCH};
    use crate::scheduler::scheduler::TaskScheduler;
    use crate::scheduler::submitter::{RetryingSubmitter, SubmitterConfig, TransportFn};
    use crate::scheduler::types::{InferenceFn, LocalTask, SchedulerConfig};

    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    /// Transport that fails with 500 for the first `failures` calls, then
    /// returns 200, counting every call.
    fn flaky_transport(failures: u32, calls: Arc<AtomicU32>) -> TransportFn {
        Arc::new(move |_url, _payload| {
            let calls = calls.clone();
            Box::pin(async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < failures {
                    Ok(500u16)
                } else {
                    Ok(200u16)
                }
            })
        })
    }

    fn ok_inference() -> InferenceFn {
        Arc::new(|_model, input| {
            Box::pin(async move {
                Ok(serde_json::json!({"label": "POSITIVE", "score": 0.9, "echo": input}))
            })
        })
    }

    fn failing_inference() -> InferenceFn {
        Arc::new(|_model, _input| {
            Box::pin(async move { Err(anyhow::anyhow!("model backend unavailable")) })
        })
    }

    // ============================================================
    // TEST 1: Retrying submitter backoff
    // ============================================================

    #[tokio::test(start_paused = true)]
    async fn test_backoff_sequence_two_failures_then_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let submitter = RetryingSubmitter::with_transport(
            flaky_transport(2, calls.clone()),
            SubmitterConfig {
                max_retries: 5,
                initial_delay: Duration::from_secs(2),
            },
        );

        let start = tokio::time::Instant::now();
        let ok = submitter
            .submit("http://sequencer/submit_result", &serde_json::json!({}))
            .await;

        assert!(ok);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Delays of 2s and 4s before the third, successful attempt.
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_exhaustion_returns_false() {
        let calls = Arc::new(AtomicU32::new(0));
        let submitter = RetryingSubmitter::with_transport(
            flaky_transport(u32::MAX, calls.clone()),
            SubmitterConfig {
                max_retries: 5,
                initial_delay: Duration::from_secs(2),
            },
        );

        let start = tokio::time::Instant::now();
        let ok = submitter
            .submit("http://sequencer/submit_result", &serde_json::json!({}))
            .await;

        assert!(!ok);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        // 2 + 4 + 8 + 16 between attempts, no sleep after the last.
        assert_eq!(start.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_transport_error_counts_as_failed_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();
        let transport: TransportFn = Arc::new(move |_url, _payload| {
            let calls = calls_clone.clone();
            Box::pin(async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(anyhow::anyhow!("connection refused"))
                } else {
                    Ok(200u16)
                }
            })
        });
        let submitter = RetryingSubmitter::with_transport(
            transport,
            SubmitterConfig {
                max_retries: 3,
                initial_delay: Duration::from_millis(1),
            },
        );

        assert!(submitter.submit("http://x", &serde_json::json!({})).await);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    // ============================================================
    // TEST 2: Scheduler lifecycle
    // ============================================================

    fn test_scheduler(
        inference: InferenceFn,
        transport: TransportFn,
        submitter_config: SubmitterConfig,
        max_task_retries: u32,
    ) -> Arc<TaskScheduler> {
        let committee = Committee::with_selection(5, 3, first_m_selection());
        let submitter = RetryingSubmitter::with_transport(transport, submitter_config);
        TaskScheduler::new(
            "node-test",
            inference,
            committee,
            submitter,
            "http://sequencer/submit_result",
            SchedulerConfig {
                workers: 1,
                max_task_retries,
                idle_poll: Duration::from_millis(10),
            },
            CancellationToken::new(),
        )
    }

    async fn wait_until<F: Fn() -> bool>(cond: F) {
        for _ in 0..200 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("condition not reached within timeout");
    }

    #[tokio::test]
    async fn test_scheduler_completes_task() {
        let calls = Arc::new(AtomicU32::new(0));
        let scheduler = test_scheduler(
            ok_inference(),
            flaky_transport(0, calls.clone()),
            SubmitterConfig {
                max_retries: 3,
                initial_delay: Duration::from_millis(1),
            },
            3,
        );

        scheduler.submit_local("parallax-llm-v1", "What is zkML?").await;
        assert_eq!(scheduler.active_count(), 1);

        scheduler.clone().start().await;
        wait_until(|| scheduler.active_count() == 0).await;

        assert!(scheduler.failed_tasks().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_scheduler_exhausts_retries_into_failed_list() {
        let calls = Arc::new(AtomicU32::new(0));
        let scheduler = test_scheduler(
            failing_inference(),
            flaky_transport(0, calls),
            SubmitterConfig::default(),
            2,
        );

        scheduler.submit_local("parallax-llm-v1", "doomed").await;
        scheduler.clone().start().await;
        wait_until(|| !scheduler.failed_tasks().is_empty()).await;

        let failed = scheduler.failed_tasks();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].retries, 2);
        assert_eq!(scheduler.active_count(), 0);
    }

    #[tokio::test]
    async fn test_retry_ceilings_are_independent() {
        // Transport never succeeds: the submitter burns its own ceiling per
        // whole-task attempt, and the scheduler makes exactly one attempt.
        let calls = Arc::new(AtomicU32::new(0));
        let scheduler = test_scheduler(
            ok_inference(),
            flaky_transport(u32::MAX, calls.clone()),
            SubmitterConfig {
                max_retries: 2,
                initial_delay: Duration::from_millis(1),
            },
            1,
        );

        scheduler.submit_local("parallax-llm-v1", "query").await;
        scheduler.clone().start().await;
        wait_until(|| !scheduler.failed_tasks().is_empty()).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(scheduler.failed_tasks()[0].retries, 1);
    }

    #[tokio::test]
    async fn test_enqueue_deduplicates_repeated_polls() {
        let calls = Arc::new(AtomicU32::new(0));
        let scheduler = test_scheduler(
            ok_inference(),
            flaky_transport(0, calls),
            SubmitterConfig::default(),
            3,
        );

        let task = LocalTask::new("task-1", "parallax-llm-v1", "q");
        assert!(scheduler.enqueue(task.clone()).await);
        assert!(!scheduler.enqueue(task).await);
        assert_eq!(scheduler.queue_len().await, 1);
    }

    // ============================================================
    // TEST 3: Batch validation and dispatch
    // ============================================================

    fn test_router() -> Arc<TaskRouter> {
        let committee = Committee::with_selection(5, 3, first_m_selection());
        let registry = SequencerRegistry::new(committee, RegistryConfig::default());
        TaskRouter::new(
            registry,
            Box::new(RoundRobin::new()),
            RouterConfig::default(),
        )
    }

    #[test]
    fn test_validate_task_payload_reasons() {
        assert!(validate_task_payload(&serde_json::json!({
            "model_id": "m", "input": "ok"
        }))
        .is_ok());

        assert_eq!(
            validate_task_payload(&serde_json::json!({"model_id": "m"})).unwrap_err(),
            "Missing required fields"
        );
        assert_eq!(
            validate_task_payload(&serde_json::json!({"model_id": "m", "input": 123}))
                .unwrap_err(),
            "Input must be a string"
        );
        assert_eq!(
            validate_task_payload(&serde_json::json!({
                "model_id": "m", "input": "x".repeat(1001)
            }))
            .unwrap_err(),
            "Input too long"
        );
    }

    #[test]
    fn test_batch_accepts_and_rejects_per_entry() {
        let router = test_router();
        let batch = vec![
            serde_json::json!({"model_id": "m", "input": "ok"}),
            serde_json::json!({"model_id": "m"}),
            serde_json::json!({"model_id": "m", "input": 123}),
        ];

        let summary = dispatch_batch(&router, &batch);

        assert_eq!(summary.accepted_count, 1);
        assert_eq!(summary.rejected_count, 2);
        assert_eq!(summary.rejected[0].reason, "Missing required fields");
        assert_eq!(summary.rejected[1].reason, "Input must be a string");
    }

    #[test]
    fn test_oversized_batch_is_truncated() {
        let router = test_router();
        let batch: Vec<serde_json::Value> = (0..150)
            .map(|i| serde_json::json!({"model_id": "m", "input": format!("q{}", i)}))
            .collect();

        let summary = dispatch_batch(&router, &batch);

        assert_eq!(summary.accepted_count, MAX_TASKS_PER_BATCH);
        assert_eq!(summary.rejected_count, 0);
    }
}
