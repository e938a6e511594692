//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! This module provides the periodic tasks that run on schedules:
//! - Daily category discovery across all onboarded stores
//!
//! # Architecture
//!
//! Scheduled tasks do not hold state of their own; each tick constructs a
//! [`DiscoveryEngine`] over the shared kernel and lets it run to completion.
//! The manual trigger route runs the same engine out-of-band.
//!
//! ```text
//! Scheduler (daily at DISCOVERY_HOUR_UTC)
//!     │
//!     └─► DiscoveryEngine::run()
//!             └─► For each store → score/select → merge → incremental pass
//! ```

use std::sync::Arc;

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::domains::discovery::{DiscoveryConfig, DiscoveryEngine};
use crate::kernel::ServerKernel;

/// Start all scheduled tasks
pub async fn start_scheduler(
    kernel: Arc<ServerKernel>,
    discovery: DiscoveryConfig,
    discovery_hour_utc: u32,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    // Daily category discovery
    let cron = format!("0 0 {} * * *", discovery_hour_utc);
    let discovery_kernel = kernel.clone();
    let discovery_job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let kernel = discovery_kernel.clone();
        let config = discovery.clone();
        Box::pin(async move {
            let engine = DiscoveryEngine::new(kernel, config);
            match engine.run().await {
                Ok(summary) => {
                    tracing::info!(
                        scanned = summary.scanned,
                        succeeded = summary.succeeded,
                        skipped = summary.skipped,
                        failed = summary.failed,
                        "Scheduled category discovery finished"
                    );
                }
                Err(e) => {
                    tracing::error!("Scheduled category discovery failed: {}", e);
                }
            }
        })
    })?;

    scheduler.add(discovery_job).await?;
    scheduler.start().await?;

    tracing::info!(
        "Scheduled tasks started (category discovery daily at {:02}:00 UTC)",
        discovery_hour_utc
    );
    Ok(scheduler)
}
