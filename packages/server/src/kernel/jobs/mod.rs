//! Job orchestration core for background reprocessing.
//!
//! This module provides the kernel-level infrastructure for one background
//! job per store:
//! - [`RunStatus`] / [`JobStatusStore`] - current-status snapshots
//! - [`CancellationSentinel`] - cooperative cross-context stop markers
//! - [`ReprocessRunner`] - the checkpointed unit-of-work loop
//!
//! # Architecture
//!
//! ```text
//! HTTP start ──► ReprocessRunner.run()
//!                    │
//!                    ├─► arm sentinel, status = running
//!                    ├─► per item: is_armed? ── no ──► status = stopped
//!                    │            classifier.process(item, stages)
//!                    │            status = running (progress)
//!                    └─► disarm, status = done
//!
//! HTTP stop ──► sentinel.disarm()   (observed at the next checkpoint)
//! ```
//!
//! Business logic (what a store's workload is, which stages to run) stays in
//! the domains; this module only provides the orchestration.

mod runner;
mod sentinel;
mod status;
mod status_store;
pub mod testing;

pub use runner::{ReprocessOptions, ReprocessRunner, RunOutcome};
pub use sentinel::{CancellationSentinel, PostgresSentinel};
pub use status::{RunState, RunStatus};
pub use status_store::{JobStatusStore, PostgresJobStatusStore};
