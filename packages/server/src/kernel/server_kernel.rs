// ServerKernel - core infrastructure with all dependencies
//
// The ServerKernel holds all server dependencies (database, external APIs,
// job orchestration stores) and provides access via traits for testability.

use sqlx::PgPool;
use std::sync::Arc;

use super::jobs::{CancellationSentinel, JobStatusStore};
use super::{BaseClassifier, BaseIdentityResolver, BasePlatformValidator, BaseRankingOracle};

/// ServerKernel holds all server dependencies
pub struct ServerKernel {
    pub db_pool: PgPool,
    pub classifier: Arc<dyn BaseClassifier>,
    pub ranking_oracle: Arc<dyn BaseRankingOracle>,
    pub identity_resolver: Arc<dyn BaseIdentityResolver>,
    pub platform_validator: Arc<dyn BasePlatformValidator>,
    /// Current-status store for reprocessing runs
    pub status_store: Arc<dyn JobStatusStore>,
    /// Cooperative cancellation markers for reprocessing runs
    pub sentinel: Arc<dyn CancellationSentinel>,
}

impl ServerKernel {
    /// Creates a new ServerKernel with the given dependencies
    pub fn new(
        db_pool: PgPool,
        classifier: Arc<dyn BaseClassifier>,
        ranking_oracle: Arc<dyn BaseRankingOracle>,
        identity_resolver: Arc<dyn BaseIdentityResolver>,
        platform_validator: Arc<dyn BasePlatformValidator>,
        status_store: Arc<dyn JobStatusStore>,
        sentinel: Arc<dyn CancellationSentinel>,
    ) -> Self {
        Self {
            db_pool,
            classifier,
            ranking_oracle,
            identity_resolver,
            platform_validator,
            status_store,
            sentinel,
        }
    }
}
