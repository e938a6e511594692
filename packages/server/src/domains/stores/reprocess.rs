//! Start/stop actions for reprocessing runs.
//!
//! Starting is fire-and-forget: the workload is enumerated, the run is
//! spawned, and the caller polls status afterwards. Stopping disarms the
//! cancellation sentinel and is idempotent.

use std::sync::Arc;

use anyhow::Result;
use tracing::error;

use super::models::Product;
use crate::kernel::jobs::{ReprocessOptions, ReprocessRunner, RunState};
use crate::kernel::ServerKernel;

/// Result of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A run was spawned over `total` items
    Started { total: usize },
    /// A run for this store is already in flight
    AlreadyRunning,
}

/// Start a reprocessing run for a store.
///
/// Best-effort single-run guard: a start is rejected while the current state
/// is `running`. This is a status check, not a lock; the status store itself
/// stays last-write-wins.
pub async fn start_reprocess(
    kernel: Arc<ServerKernel>,
    resource_key: &str,
    options: ReprocessOptions,
) -> Result<StartOutcome> {
    let status = kernel.status_store.get_state(resource_key).await?;
    if status.state == RunState::Running {
        return Ok(StartOutcome::AlreadyRunning);
    }

    let items = Product::ids_for_store(resource_key, &kernel.db_pool).await?;
    let total = items.len();

    let key = resource_key.to_string();
    tokio::spawn(async move {
        let runner = ReprocessRunner::new(
            kernel.status_store.clone(),
            kernel.sentinel.clone(),
            kernel.classifier.clone(),
        );
        if let Err(e) = runner.run(&key, &items, &options).await {
            // Terminal state and log line were already recorded by the runner.
            error!(resource_key = %key, error = %format!("{:#}", e), "reprocess run failed");
        }
    });

    Ok(StartOutcome::Started { total })
}

/// Request a stop for a store's run.
///
/// Returns whether a sentinel was actually removed; stopping an
/// already-stopped or never-started run is a successful no-op.
pub async fn request_stop(kernel: &ServerKernel, resource_key: &str) -> Result<bool> {
    kernel.sentinel.disarm(resource_key).await
}
