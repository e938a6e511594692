use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Product - the unit of work for reprocessing runs.
///
/// The sync pipeline owns the full product model; this backend only needs
/// enough to enumerate a store's workload in a stable order.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub resource_key: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Product {
    /// Find a product by ID
    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Self> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(product)
    }

    /// Workload for one store, in insertion order.
    ///
    /// The runner processes these strictly in the returned order.
    pub async fn ids_for_store(resource_key: &str, pool: &PgPool) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM products
            WHERE resource_key = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(resource_key)
        .fetch_all(pool)
        .await?;
        Ok(ids)
    }

    /// Number of products for one store
    pub async fn count_for_store(resource_key: &str, pool: &PgPool) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products WHERE resource_key = $1")
                .bind(resource_key)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}
