//! End-to-end tests for the reprocess runner against in-memory stores.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use server_core::kernel::jobs::testing::{InMemoryJobStatusStore, InMemorySentinel};
use server_core::kernel::jobs::{
    CancellationSentinel, JobStatusStore, ReprocessOptions, ReprocessRunner, RunOutcome, RunState,
};
use server_core::kernel::test_dependencies::MockClassifier;
use server_core::kernel::{BaseClassifier, PipelineStages};

fn items(n: usize) -> Vec<Uuid> {
    (0..n).map(|_| Uuid::new_v4()).collect()
}

fn runner(
    status: &Arc<InMemoryJobStatusStore>,
    sentinel: &Arc<InMemorySentinel>,
    classifier: &Arc<MockClassifier>,
) -> ReprocessRunner {
    ReprocessRunner::new(status.clone(), sentinel.clone(), classifier.clone())
}

/// Disarms the sentinel after processing a fixed number of items, standing in
/// for a stop request arriving from another execution context mid-run.
struct DisarmingClassifier {
    sentinel: Arc<InMemorySentinel>,
    resource_key: String,
    disarm_after: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl BaseClassifier for DisarmingClassifier {
    async fn process(&self, _product_id: Uuid, _stages: &PipelineStages) -> Result<()> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.disarm_after {
            self.sentinel.disarm(&self.resource_key).await?;
        }
        Ok(())
    }
}

#[tokio::test]
async fn fresh_resource_reports_synthesized_idle_state() {
    let status = Arc::new(InMemoryJobStatusStore::new());

    let state = status.get_state("never-seen").await.unwrap();
    assert_eq!(state.state, RunState::Idle);
    assert_eq!(state.progress, 0);
    assert_eq!(state.done, 0);
    assert_eq!(state.total, 0);
}

#[tokio::test]
async fn completed_run_reaches_done() {
    let status = Arc::new(InMemoryJobStatusStore::new());
    let sentinel = Arc::new(InMemorySentinel::new());
    let classifier = Arc::new(MockClassifier::new());
    let workload = items(3);

    let outcome = runner(&status, &sentinel, &classifier)
        .run("store-1", &workload, &ReprocessOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Completed { processed: 3 });
    assert_eq!(classifier.processed_count(), 3);

    let state = status.get_state("store-1").await.unwrap();
    assert_eq!(state.state, RunState::Done);
    assert_eq!(state.progress, 100);
    assert_eq!(state.done, 3);
    assert_eq!(state.total, 3);
    assert!(state.started_at.is_some());
    assert!(state.finished_at.is_some());

    // The sentinel never outlives the run.
    assert!(!sentinel.is_armed("store-1").await.unwrap());
}

#[tokio::test]
async fn progress_is_monotonically_non_decreasing() {
    let status = Arc::new(InMemoryJobStatusStore::new());
    let sentinel = Arc::new(InMemorySentinel::new());
    let classifier = Arc::new(MockClassifier::new());
    let workload = items(5);

    runner(&status, &sentinel, &classifier)
        .run("store-1", &workload, &ReprocessOptions::default())
        .await
        .unwrap();

    let writes = status.writes("store-1");
    assert_eq!(writes.first().unwrap().total, 5);

    for pair in writes.windows(2) {
        assert!(pair[1].done >= pair[0].done, "done went backwards: {:?}", writes);
        assert!(
            pair[1].progress >= pair[0].progress,
            "progress went backwards: {:?}",
            writes
        );
    }
}

#[tokio::test]
async fn disarming_mid_run_stops_before_the_next_item() {
    let status = Arc::new(InMemoryJobStatusStore::new());
    let sentinel = Arc::new(InMemorySentinel::new());
    let classifier = Arc::new(DisarmingClassifier {
        sentinel: sentinel.clone(),
        resource_key: "store-1".to_string(),
        disarm_after: 2,
        calls: AtomicUsize::new(0),
    });
    let workload = items(5);

    let runner = ReprocessRunner::new(status.clone(), sentinel.clone(), classifier);
    let outcome = runner
        .run("store-1", &workload, &ReprocessOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Stopped { processed: 2 });

    let state = status.get_state("store-1").await.unwrap();
    assert_eq!(state.state, RunState::Stopped);
    assert_eq!(state.done, 2);
    assert_eq!(state.total, 5);
    assert!(state.done < state.total);
}

#[tokio::test]
async fn stop_requests_are_idempotent() {
    let sentinel = Arc::new(InMemorySentinel::new());
    sentinel.arm("store-1").await.unwrap();

    // First stop removes the marker, the second reports "already stopped".
    assert!(sentinel.disarm("store-1").await.unwrap());
    assert!(!sentinel.disarm("store-1").await.unwrap());
    assert!(!sentinel.disarm("store-1").await.unwrap());
}

#[tokio::test]
async fn failed_items_are_skipped_and_logged_by_default() {
    let status = Arc::new(InMemoryJobStatusStore::new());
    let sentinel = Arc::new(InMemorySentinel::new());
    let workload = items(3);
    let classifier = Arc::new(MockClassifier::new().with_failure_for(workload[1]));

    let outcome = runner(&status, &sentinel, &classifier)
        .run("store-1", &workload, &ReprocessOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Completed { processed: 3 });
    assert_eq!(classifier.processed_count(), 3);

    let state = status.get_state("store-1").await.unwrap();
    assert_eq!(state.state, RunState::Done);
    assert_eq!(state.logs.len(), 1);
    assert!(state.logs[0].contains(&workload[1].to_string()));
}

#[tokio::test]
async fn abort_policy_marks_run_as_error() {
    let status = Arc::new(InMemoryJobStatusStore::new());
    let sentinel = Arc::new(InMemorySentinel::new());
    let workload = items(3);
    let classifier = Arc::new(MockClassifier::new().with_failure_for(workload[1]));

    let options = ReprocessOptions {
        continue_on_item_error: false,
        ..Default::default()
    };
    let result = runner(&status, &sentinel, &classifier)
        .run("store-1", &workload, &options)
        .await;

    assert!(result.is_err());

    let state = status.get_state("store-1").await.unwrap();
    assert_eq!(state.state, RunState::Error);
    assert_eq!(state.done, 1);
    assert!(!state.logs.is_empty());
    assert!(!sentinel.is_armed("store-1").await.unwrap());
}

#[tokio::test]
async fn empty_workload_completes_immediately() {
    let status = Arc::new(InMemoryJobStatusStore::new());
    let sentinel = Arc::new(InMemorySentinel::new());
    let classifier = Arc::new(MockClassifier::new());

    let outcome = runner(&status, &sentinel, &classifier)
        .run("store-1", &[], &ReprocessOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Completed { processed: 0 });

    let state = status.get_state("store-1").await.unwrap();
    assert_eq!(state.state, RunState::Done);
    assert_eq!(state.progress, 100);
    assert_eq!(state.total, 0);
}

#[tokio::test]
async fn sentinel_read_failure_keeps_the_run_alive() {
    let status = Arc::new(InMemoryJobStatusStore::new());
    let sentinel = Arc::new(InMemorySentinel::new());
    let classifier = Arc::new(MockClassifier::new());
    let workload = items(3);

    // Arm succeeds, then every is_armed check errors out. The runner treats
    // "cannot determine cancellation" as keep-running.
    sentinel.fail_reads(true);

    let outcome = runner(&status, &sentinel, &classifier)
        .run("store-1", &workload, &ReprocessOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Completed { processed: 3 });
    let state = status.get_state("store-1").await.unwrap();
    assert_eq!(state.state, RunState::Done);
}

#[tokio::test]
async fn incremental_options_reach_the_classifier() {
    let status = Arc::new(InMemoryJobStatusStore::new());
    let sentinel = Arc::new(InMemorySentinel::new());
    let classifier = Arc::new(MockClassifier::new());
    let workload = items(2);

    runner(&status, &sentinel, &classifier)
        .run("store-1", &workload, &ReprocessOptions::incremental())
        .await
        .unwrap();

    for call in classifier.calls() {
        assert_eq!(call.stages, PipelineStages::soft_categories_only());
    }
}

#[tokio::test]
async fn a_new_start_resets_the_previous_runs_logs() {
    let status = Arc::new(InMemoryJobStatusStore::new());
    let sentinel = Arc::new(InMemorySentinel::new());
    let workload = items(2);
    let classifier = Arc::new(MockClassifier::new().with_failure_for(workload[0]));

    runner(&status, &sentinel, &classifier)
        .run("store-1", &workload, &ReprocessOptions::default())
        .await
        .unwrap();
    assert_eq!(status.get_state("store-1").await.unwrap().logs.len(), 1);

    // Second run over a clean workload starts with empty logs.
    let clean = Arc::new(MockClassifier::new());
    runner(&status, &sentinel, &clean)
        .run("store-1", &workload, &ReprocessOptions::default())
        .await
        .unwrap();
    assert!(status.get_state("store-1").await.unwrap().logs.is_empty());
}
