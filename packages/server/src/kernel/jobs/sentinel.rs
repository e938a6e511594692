//! Cooperative cancellation sentinels.
//!
//! A sentinel is a presence/absence marker keyed by resource key: existence
//! means "the run is permitted to continue", deletion means "stop requested".
//! The runner and the stop-request handler may live in different tasks or
//! processes that only share the database, so the marker is a table row
//! rather than an in-memory flag. It survives the completion of the HTTP
//! request that issued the stop.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

/// Trait for arming, checking and disarming cancellation markers.
#[async_trait]
pub trait CancellationSentinel: Send + Sync {
    /// Create the marker. Called once when a run starts; re-arming an
    /// already-armed key is a no-op.
    async fn arm(&self, resource_key: &str) -> Result<()>;

    /// True iff the marker currently exists. Checked by the runner before
    /// each unit of work.
    async fn is_armed(&self, resource_key: &str) -> Result<bool>;

    /// Delete the marker if present. Returns whether a marker was actually
    /// removed; deleting an absent marker is a successful no-op.
    async fn disarm(&self, resource_key: &str) -> Result<bool>;
}

/// PostgreSQL-backed sentinel store.
pub struct PostgresSentinel {
    pool: PgPool,
}

impl PostgresSentinel {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CancellationSentinel for PostgresSentinel {
    async fn arm(&self, resource_key: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO run_sentinels (resource_key, armed_at)
            VALUES ($1, NOW())
            ON CONFLICT (resource_key) DO NOTHING
            "#,
        )
        .bind(resource_key)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn is_armed(&self, resource_key: &str) -> Result<bool> {
        let armed = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM run_sentinels WHERE resource_key = $1)",
        )
        .bind(resource_key)
        .fetch_one(&self.pool)
        .await?;

        Ok(armed)
    }

    async fn disarm(&self, resource_key: &str) -> Result<bool> {
        let removed = sqlx::query("DELETE FROM run_sentinels WHERE resource_key = $1")
            .bind(resource_key)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(removed > 0)
    }
}
