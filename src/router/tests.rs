//! Router Module Tests
//!
//! Covers round-robin fairness, liveness filtering, the staleness boundary,
//! reversion when no node is available, and assignment exclusivity under
//! concurrent attempts.

#[cfg(test)]
mod tests {
    use crate::committee::signer::{first_m_selection, Committee};
    use crate::registry::service::{RegistryConfig, SequencerRegistry};
    use crate::registry::types::{now_ms, TaskStatus};
    use crate::router::policy::{LowestLatency, RoundRobin, SelectionPolicy};
    use crate::router::service::{RouterConfig, TaskRouter};
    use std::sync::Arc;

    fn setup() -> (Arc<SequencerRegistry>, Arc<TaskRouter>) {
        let committee = Committee::with_selection(5, 3, first_m_selection());
        let registry = SequencerRegistry::new(committee, RegistryConfig::default());
        let router = TaskRouter::new(
            registry.clone(),
            Box::new(RoundRobin::new()),
            RouterConfig::default(),
        );
        (registry, router)
    }

    fn register(registry: &SequencerRegistry, node_id: &str, models: &[&str]) {
        registry
            .register_node(
                node_id,
                models.iter().map(|m| m.to_string()).collect(),
                "pubkey",
            )
            .unwrap();
    }

    // ============================================================
    // TEST 1: Round-robin fairness
    // ============================================================

    #[test]
    fn test_round_robin_cycles_a_b_a() {
        let (registry, router) = setup();
        register(&registry, "node-a", &["parallax-llm-v1"]);
        register(&registry, "node-b", &["parallax-llm-v1"]);

        let first = router.enqueue_task("parallax-llm-v1", "q1").unwrap();
        let second = router.enqueue_task("parallax-llm-v1", "q2").unwrap();
        let third = router.enqueue_task("parallax-llm-v1", "q3").unwrap();

        assert_eq!(first.assigned_to.as_deref(), Some("node-a"));
        assert_eq!(second.assigned_to.as_deref(), Some("node-b"));
        assert_eq!(third.assigned_to.as_deref(), Some("node-a"));
    }

    #[test]
    fn test_round_robin_empty_set() {
        let policy = RoundRobin::new();
        assert_eq!(policy.select(&[]), None);
    }

    #[test]
    fn test_lowest_latency_picks_first() {
        let policy = LowestLatency;
        let candidates = vec!["node-a".to_string(), "node-b".to_string()];
        assert_eq!(policy.select(&candidates).as_deref(), Some("node-a"));
    }

    // ============================================================
    // TEST 2: Compatibility and liveness filtering
    // ============================================================

    #[test]
    fn test_routing_miss_leaves_task_queued() {
        let (registry, router) = setup();
        register(&registry, "node-a", &["quant-forecast-lite"]);

        let outcome = router.enqueue_task("vision-encoder-v2", "caption this").unwrap();
        assert!(outcome.assigned_to.is_none());

        let task = registry.get_task(&outcome.task_id).unwrap();
        assert_eq!(task.status, TaskStatus::Queued);
        assert!(task.assigned_node.is_none());
    }

    #[test]
    fn test_node_outside_liveness_window_is_skipped() {
        let (registry, router) = setup();
        register(&registry, "node-stale", &["parallax-llm-v1"]);
        register(&registry, "node-live", &["parallax-llm-v1"]);

        // Age node-stale past the 60s liveness window.
        registry.nodes.get_mut("node-stale").unwrap().last_seen = now_ms() - 61_000;

        for _ in 0..3 {
            assert_eq!(
                router.find_compatible_node("parallax-llm-v1").as_deref(),
                Some("node-live")
            );
        }
    }

    // ============================================================
    // TEST 3: Staleness sweep
    // ============================================================

    #[test]
    fn test_stale_task_is_reassigned_past_threshold() {
        let (registry, router) = setup();
        register(&registry, "node-a", &["parallax-llm-v1"]);

        let outcome = router.enqueue_task("parallax-llm-v1", "query").unwrap();
        assert!(outcome.assigned_to.is_some());

        let t0 = registry.get_task(&outcome.task_id).unwrap().assigned_at.unwrap();

        // 29s after assignment: not yet stale.
        assert_eq!(router.reassign_stale_tasks_at(t0 + 29_000), 0);
        let untouched = registry.get_task(&outcome.task_id).unwrap();
        assert_eq!(untouched.assigned_at, Some(t0));
        assert_eq!(untouched.reassign_count, 0);

        // 31s after assignment: reassigned with a fresh timestamp.
        assert_eq!(router.reassign_stale_tasks_at(t0 + 31_000), 1);
        let moved = registry.get_task(&outcome.task_id).unwrap();
        assert_eq!(moved.status, TaskStatus::Assigned);
        assert_eq!(moved.reassign_count, 1);
        // A fresh wall-clock timestamp, not the sweep's logical `now`.
        assert!(moved.assigned_at.unwrap() >= t0);
    }

    #[test]
    fn test_stale_task_without_nodes_reverts_to_queued() {
        let (registry, router) = setup();
        register(&registry, "node-a", &["parallax-llm-v1"]);

        let outcome = router.enqueue_task("parallax-llm-v1", "query").unwrap();
        let t0 = registry.get_task(&outcome.task_id).unwrap().assigned_at.unwrap();

        // The only capable node goes dark.
        registry.nodes.get_mut("node-a").unwrap().last_seen = now_ms() - 120_000;

        assert_eq!(router.reassign_stale_tasks_at(t0 + 31_000), 0);
        let task = registry.get_task(&outcome.task_id).unwrap();
        assert_eq!(task.status, TaskStatus::Queued);
        assert!(task.assigned_node.is_none());
        assert!(task.assigned_at.is_none());
    }

    #[test]
    fn test_reverted_task_recovers_when_node_returns() {
        let (registry, router) = setup();
        register(&registry, "node-a", &["parallax-llm-v1"]);

        let outcome = router.enqueue_task("parallax-llm-v1", "query").unwrap();
        let t0 = registry.get_task(&outcome.task_id).unwrap().assigned_at.unwrap();

        // Node goes dark; the stale sweep reverts the task to Queued.
        registry.nodes.get_mut("node-a").unwrap().last_seen = now_ms() - 120_000;
        assert_eq!(router.reassign_stale_tasks_at(t0 + 31_000), 0);
        assert_eq!(
            registry.get_task(&outcome.task_id).unwrap().status,
            TaskStatus::Queued
        );

        // While the pool is empty, further sweeps keep retrying without
        // losing sight of the task.
        assert_eq!(router.reassign_stale_tasks_at(t0 + 62_000), 0);
        assert_eq!(
            registry.get_task(&outcome.task_id).unwrap().status,
            TaskStatus::Queued
        );

        // Node comes back: the next sweep picks the queued task up again.
        registry.nodes.get_mut("node-a").unwrap().last_seen = now_ms();
        assert_eq!(router.reassign_stale_tasks_at(t0 + 93_000), 1);
        let task = registry.get_task(&outcome.task_id).unwrap();
        assert_eq!(task.status, TaskStatus::Assigned);
        assert_eq!(task.assigned_node.as_deref(), Some("node-a"));
    }

    #[test]
    fn test_sweep_assigns_queued_backlog() {
        let (registry, router) = setup();

        // A routing miss at enqueue time leaves the task Queued.
        let outcome = router.enqueue_task("parallax-llm-v1", "early bird").unwrap();
        assert!(outcome.assigned_to.is_none());

        // A node registering later is enough; no new enqueue is needed.
        register(&registry, "node-a", &["parallax-llm-v1"]);
        assert_eq!(router.reassign_stale_tasks(), 1);
        let task = registry.get_task(&outcome.task_id).unwrap();
        assert_eq!(task.status, TaskStatus::Assigned);
        assert_eq!(task.reassign_count, 0);
    }

    #[test]
    fn test_completed_task_never_reassigned() {
        let (registry, router) = setup();
        register(&registry, "node-a", &["parallax-llm-v1"]);

        let outcome = router.enqueue_task("parallax-llm-v1", "query").unwrap();
        let t0 = registry.get_task(&outcome.task_id).unwrap().assigned_at.unwrap();

        // Force-complete the task, then sweep far past the threshold.
        {
            let mut entry = registry.tasks.get_mut(&outcome.task_id).unwrap();
            entry.status = TaskStatus::Completed;
            entry.assigned_node = None;
        }

        assert_eq!(router.reassign_stale_tasks_at(t0 + 600_000), 0);
        assert_eq!(
            registry.get_task(&outcome.task_id).unwrap().status,
            TaskStatus::Completed
        );
        assert!(router.assign_task_to_node(&outcome.task_id).is_none());
    }

    // ============================================================
    // TEST 4: Assignment exclusivity
    // ============================================================

    #[tokio::test]
    async fn test_concurrent_assignment_yields_single_assignee() {
        let (registry, router) = setup();
        for i in 0..4 {
            register(&registry, &format!("node-{}", i), &["parallax-llm-v1"]);
        }

        let task_id = registry.submit_task("parallax-llm-v1", "query").unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let router = router.clone();
            let task_id = task_id.clone();
            handles.push(tokio::spawn(async move {
                router.assign_task_to_node(&task_id)
            }));
        }
        for handle in handles {
            // Every attempt reaches a decision; none may panic.
            handle.await.unwrap();
        }

        let task = registry.get_task(&task_id).unwrap();
        assert_eq!(task.status, TaskStatus::Assigned);
        let assignee = task.assigned_node.expect("task must end with one assignee");
        assert!(registry.nodes.contains_key(&assignee));
    }
}
