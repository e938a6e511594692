//! Job status store: the persistence seam for run status snapshots.
//!
//! The runner and the HTTP boundary only ever talk to the [`JobStatusStore`]
//! trait; production uses [`PostgresJobStatusStore`], tests use the in-memory
//! implementation from [`super::testing`].

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use super::status::{RunState, RunStatus};

/// Trait for persisting and serving run status snapshots.
#[async_trait]
pub trait JobStatusStore: Send + Sync {
    /// Upsert the full status snapshot. Persistence errors propagate to the
    /// caller, who decides whether to retry or abort the run.
    async fn set_state(
        &self,
        resource_key: &str,
        state: RunState,
        progress: i32,
        done: i32,
        total: i32,
    ) -> Result<()>;

    /// Current status for a resource key. A missing record is a valid idle
    /// state and is synthesized, never an error.
    async fn get_state(&self, resource_key: &str) -> Result<RunStatus>;

    /// Append a log line without clobbering other fields.
    async fn append_log(&self, resource_key: &str, message: &str) -> Result<()>;
}

/// PostgreSQL-backed status store.
pub struct PostgresJobStatusStore {
    pool: PgPool,
}

impl PostgresJobStatusStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStatusStore for PostgresJobStatusStore {
    async fn set_state(
        &self,
        resource_key: &str,
        state: RunState,
        progress: i32,
        done: i32,
        total: i32,
    ) -> Result<()> {
        RunStatus::upsert_state(resource_key, state, progress, done, total, &self.pool).await
    }

    async fn get_state(&self, resource_key: &str) -> Result<RunStatus> {
        let status = RunStatus::fetch(resource_key, &self.pool).await?;
        Ok(status.unwrap_or_else(|| RunStatus::idle(resource_key)))
    }

    async fn append_log(&self, resource_key: &str, message: &str) -> Result<()> {
        RunStatus::push_log(resource_key, message, &self.pool).await
    }
}
