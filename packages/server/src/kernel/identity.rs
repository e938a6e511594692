// Identity resolution from credential tokens
//
// Token issuance lives elsewhere; this only answers "which store does this
// bearer token belong to", treating the lookup table as opaque credentials.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use super::{BaseIdentityResolver, Identity};

/// Resolver backed by the api_tokens table
pub struct PostgresIdentityResolver {
    pool: PgPool,
}

impl PostgresIdentityResolver {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseIdentityResolver for PostgresIdentityResolver {
    async fn resolve(&self, token: &str) -> Result<Option<Identity>> {
        let resource_key = sqlx::query_scalar::<_, String>(
            "SELECT resource_key FROM api_tokens WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(resource_key.map(|resource_key| Identity { resource_key }))
    }
}
