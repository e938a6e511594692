use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use typed_builder::TypedBuilder;

use crate::domains::discovery::PotentialCategoryObservation;

/// Store configuration - the aggregate owned by onboarding.
///
/// Connection credentials are opaque to this backend; the active category
/// set grows via the discovery merge and is otherwise only replaced wholesale
/// by re-onboarding.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct StoreConfiguration {
    pub resource_key: String,
    pub platform: String,
    pub credentials: serde_json::Value,
    #[builder(default)]
    pub categories: Vec<String>,
    #[builder(default)]
    pub soft_categories: Vec<String>,
    #[builder(default)]
    pub product_types: Vec<String>,
    #[builder(default = "full".to_string())]
    pub sync_mode: String,
    #[builder(default = Json(BTreeMap::new()))]
    pub potential_categories: Json<BTreeMap<String, PotentialCategoryObservation>>,
    #[builder(default, setter(strip_option))]
    pub first_completed_at: Option<DateTime<Utc>>,
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
    #[builder(default = Utc::now())]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl StoreConfiguration {
    /// Find a store configuration by resource key
    pub async fn find_by_resource_key(resource_key: &str, pool: &PgPool) -> Result<Option<Self>> {
        let config = sqlx::query_as::<_, StoreConfiguration>(
            "SELECT * FROM store_configs WHERE resource_key = $1",
        )
        .bind(resource_key)
        .fetch_optional(pool)
        .await?;
        Ok(config)
    }

    /// Find all stores with at least one potential category observation
    pub async fn find_with_observations(pool: &PgPool) -> Result<Vec<Self>> {
        let configs = sqlx::query_as::<_, StoreConfiguration>(
            r#"
            SELECT * FROM store_configs
            WHERE potential_categories <> '{}'::jsonb
            ORDER BY resource_key
            "#,
        )
        .fetch_all(pool)
        .await?;
        Ok(configs)
    }

    /// Idempotent upsert keyed by resource key.
    ///
    /// Re-running with identical input is a no-op apart from `updated_at`.
    /// Observations are never part of an onboarding payload, so the stored
    /// map is preserved on conflict, and `first_completed_at` is only ever
    /// written once (stored value wins).
    pub async fn upsert(&self, pool: &PgPool) -> Result<Self> {
        let config = sqlx::query_as::<_, StoreConfiguration>(
            r#"
            INSERT INTO store_configs (
                resource_key, platform, credentials, categories, soft_categories,
                product_types, sync_mode, potential_categories, first_completed_at,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (resource_key) DO UPDATE SET
                platform = EXCLUDED.platform,
                credentials = EXCLUDED.credentials,
                categories = EXCLUDED.categories,
                soft_categories = EXCLUDED.soft_categories,
                product_types = EXCLUDED.product_types,
                sync_mode = EXCLUDED.sync_mode,
                potential_categories = store_configs.potential_categories,
                first_completed_at = COALESCE(store_configs.first_completed_at, EXCLUDED.first_completed_at),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(&self.resource_key)
        .bind(&self.platform)
        .bind(&self.credentials)
        .bind(&self.categories)
        .bind(&self.soft_categories)
        .bind(&self.product_types)
        .bind(&self.sync_mode)
        .bind(&self.potential_categories)
        .bind(self.first_completed_at)
        .bind(self.created_at)
        .bind(self.updated_at)
        .fetch_one(pool)
        .await?;
        Ok(config)
    }

    /// Persist the result of a discovery merge: the unioned category set and
    /// the observations that were not promoted.
    pub async fn apply_discovery_merge(
        resource_key: &str,
        categories: &[String],
        remaining: &BTreeMap<String, PotentialCategoryObservation>,
        pool: &PgPool,
    ) -> Result<Self> {
        let config = sqlx::query_as::<_, StoreConfiguration>(
            r#"
            UPDATE store_configs
            SET categories = $2,
                potential_categories = $3,
                updated_at = NOW()
            WHERE resource_key = $1
            RETURNING *
            "#,
        )
        .bind(resource_key)
        .bind(categories)
        .bind(Json(remaining))
        .fetch_one(pool)
        .await?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_to_full_sync_and_empty_sets() {
        let config = StoreConfiguration::builder()
            .resource_key("store-1")
            .platform("shopify")
            .credentials(serde_json::json!({"access_token": "shpat_x"}))
            .build();

        assert_eq!(config.sync_mode, "full");
        assert!(config.categories.is_empty());
        assert!(config.potential_categories.is_empty());
        assert!(config.first_completed_at.is_none());
    }
}
