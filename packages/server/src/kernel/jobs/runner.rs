//! Reprocess runner: drives one bounded classification pass for a store.
//!
//! The runner walks a workload of product ids in input order, pushing each
//! through the classification pipeline and reporting progress to the status
//! store. Before every item it consults the cancellation sentinel, so
//! cancellation latency is bounded by the cost of one item, never the whole
//! batch.
//!
//! # State machine
//!
//! ```text
//! idle --start--> running --(all items processed)--> done
//!                 running --(uncaught failure)-----> error
//!                 running --(sentinel disarmed)----> stopped
//! ```
//!
//! Terminal states return to `running` only via a new start.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::sentinel::CancellationSentinel;
use super::status::RunState;
use super::status_store::JobStatusStore;
use crate::kernel::{BaseClassifier, PipelineStages};

/// Options for one reprocessing run.
#[derive(Debug, Clone)]
pub struct ReprocessOptions {
    /// Which pipeline stages to recompute per item.
    pub stages: PipelineStages,
    /// Item-failure policy: skip-and-log when true (the default), abort the
    /// whole run as `error` when false. Systemic failures (status store
    /// unreachable) always abort regardless.
    pub continue_on_item_error: bool,
}

impl Default for ReprocessOptions {
    fn default() -> Self {
        Self {
            stages: PipelineStages::all(),
            continue_on_item_error: true,
        }
    }
}

impl ReprocessOptions {
    /// Options for the discovery engine's incremental pass: soft-category
    /// recomputation only.
    pub fn incremental() -> Self {
        Self {
            stages: PipelineStages::soft_categories_only(),
            ..Default::default()
        }
    }
}

/// How a run ended, short of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// All items were processed.
    Completed { processed: usize },
    /// The sentinel was disarmed; `processed` items were finished before the
    /// checkpoint observed the stop request.
    Stopped { processed: usize },
}

/// Drives reprocessing runs against the status store, sentinel and
/// classification pipeline.
pub struct ReprocessRunner {
    status: Arc<dyn JobStatusStore>,
    sentinel: Arc<dyn CancellationSentinel>,
    classifier: Arc<dyn BaseClassifier>,
}

impl ReprocessRunner {
    pub fn new(
        status: Arc<dyn JobStatusStore>,
        sentinel: Arc<dyn CancellationSentinel>,
        classifier: Arc<dyn BaseClassifier>,
    ) -> Self {
        Self {
            status,
            sentinel,
            classifier,
        }
    }

    /// Run one reprocessing pass over `items`, in input order.
    ///
    /// Arms the sentinel, transitions the status to `running`, then processes
    /// items one at a time with a cancellation checkpoint before each. Ends
    /// in `done`, `stopped` or `error`; the sentinel is disarmed on every
    /// exit path. A `stopped` outcome is an intentional success, not an
    /// error.
    pub async fn run(
        &self,
        resource_key: &str,
        items: &[Uuid],
        options: &ReprocessOptions,
    ) -> Result<RunOutcome> {
        let total = items.len();

        info!(
            resource_key = %resource_key,
            total,
            stages = ?options.stages,
            "reprocess run starting"
        );

        self.sentinel
            .arm(resource_key)
            .await
            .context("failed to arm cancellation sentinel")?;

        if let Err(e) = self
            .status
            .set_state(resource_key, RunState::Running, 0, 0, total as i32)
            .await
        {
            let _ = self.sentinel.disarm(resource_key).await;
            return Err(e.context("failed to record run start"));
        }

        for (i, product_id) in items.iter().enumerate() {
            // Checkpoint: cancellation is observed here, before each item.
            match self.sentinel.is_armed(resource_key).await {
                Ok(true) => {}
                Ok(false) => {
                    info!(
                        resource_key = %resource_key,
                        done = i,
                        total,
                        "stop requested, halting run"
                    );
                    self.status
                        .set_state(
                            resource_key,
                            RunState::Stopped,
                            percent(i, total),
                            i as i32,
                            total as i32,
                        )
                        .await
                        .context("failed to record stopped state")?;
                    return Ok(RunOutcome::Stopped { processed: i });
                }
                Err(e) => {
                    // Cannot determine cancellation; the conservative choice
                    // is to keep running rather than fail the whole batch.
                    warn!(
                        resource_key = %resource_key,
                        error = %e,
                        "sentinel check failed, continuing run"
                    );
                }
            }

            debug!(resource_key = %resource_key, product_id = %product_id, "processing item");

            if let Err(e) = self.classifier.process(*product_id, &options.stages).await {
                if options.continue_on_item_error {
                    warn!(
                        resource_key = %resource_key,
                        product_id = %product_id,
                        error = %e,
                        "item failed, skipping"
                    );
                    self.status
                        .append_log(
                            resource_key,
                            &format!("product {} failed: {:#}", product_id, e),
                        )
                        .await
                        .context("failed to log item failure")?;
                } else {
                    error!(
                        resource_key = %resource_key,
                        product_id = %product_id,
                        error = %e,
                        "item failed, aborting run"
                    );
                    let _ = self.sentinel.disarm(resource_key).await;
                    self.status
                        .set_state(
                            resource_key,
                            RunState::Error,
                            percent(i, total),
                            i as i32,
                            total as i32,
                        )
                        .await
                        .context("failed to record error state")?;
                    self.status
                        .append_log(
                            resource_key,
                            &format!("run aborted at product {}: {:#}", product_id, e),
                        )
                        .await
                        .context("failed to log run abort")?;
                    return Err(e.context(format!(
                        "reprocess run for {} aborted at item {}",
                        resource_key, product_id
                    )));
                }
            }

            let done = i + 1;
            if let Err(e) = self
                .status
                .set_state(
                    resource_key,
                    RunState::Running,
                    percent(done, total),
                    done as i32,
                    total as i32,
                )
                .await
            {
                // Without status visibility the run cannot safely continue.
                error!(
                    resource_key = %resource_key,
                    error = %e,
                    "status write failed, aborting run"
                );
                let _ = self.sentinel.disarm(resource_key).await;
                return Err(e.context("failed to record run progress"));
            }
        }

        self.sentinel
            .disarm(resource_key)
            .await
            .context("failed to disarm cancellation sentinel")?;
        self.status
            .set_state(
                resource_key,
                RunState::Done,
                100,
                total as i32,
                total as i32,
            )
            .await
            .context("failed to record run completion")?;

        info!(resource_key = %resource_key, total, "reprocess run complete");

        Ok(RunOutcome::Completed { processed: total })
    }
}

/// Integer progress percentage; an empty workload is complete by definition.
fn percent(done: usize, total: usize) -> i32 {
    if total == 0 {
        100
    } else {
        (done * 100 / total) as i32
    }
}
