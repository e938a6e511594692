// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (what to classify, which terms to promote) lives in the
// domain layers and uses these traits.
//
// Naming convention: Base* for trait names (e.g., BaseClassifier)

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Classification Pipeline Trait (Infrastructure)
// =============================================================================

/// Per-stage enable flags for the downstream classification pipeline.
///
/// The incremental discovery pass runs with only `soft_categories` enabled so
/// it stays cheap and does not touch existing embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStages {
    pub hard_categories: bool,
    pub soft_categories: bool,
    pub types: bool,
    pub variants: bool,
    pub embeddings: bool,
    pub descriptions: bool,
}

impl PipelineStages {
    /// Every pipeline stage enabled (full reprocess).
    pub fn all() -> Self {
        Self {
            hard_categories: true,
            soft_categories: true,
            types: true,
            variants: true,
            embeddings: true,
            descriptions: true,
        }
    }

    /// Only the soft-category recomputation stage enabled.
    pub fn soft_categories_only() -> Self {
        Self {
            hard_categories: false,
            soft_categories: true,
            types: false,
            variants: false,
            embeddings: false,
            descriptions: false,
        }
    }
}

impl Default for PipelineStages {
    fn default() -> Self {
        Self::all()
    }
}

#[async_trait]
pub trait BaseClassifier: Send + Sync {
    /// Process one product through the classification pipeline.
    ///
    /// Only the stages enabled in `stages` are recomputed.
    async fn process(&self, product_id: Uuid, stages: &PipelineStages) -> Result<()>;
}

// =============================================================================
// Ranking Oracle Trait (Infrastructure - advisory, never trusted blindly)
// =============================================================================

/// A candidate term handed to the ranking oracle, with its usage metadata.
#[derive(Debug, Clone, Serialize)]
pub struct RankCandidate {
    pub term: String,
    pub count: i64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub example_queries: Vec<String>,
}

#[async_trait]
pub trait BaseRankingOracle: Send + Sync {
    /// Select the best candidate terms, at most `max_terms`, all disjoint
    /// from `existing` and from each other.
    ///
    /// The response is advisory: callers must re-validate disjointness before
    /// acting on it. An error here is expected to trigger the deterministic
    /// fallback scorer, never to fail a discovery run.
    async fn rank(
        &self,
        candidates: &[RankCandidate],
        existing: &[String],
        max_terms: usize,
    ) -> Result<Vec<String>>;
}

// =============================================================================
// Identity Resolver Trait (Infrastructure - opaque credential lookup)
// =============================================================================

/// The identity a credential token resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub resource_key: String,
}

#[async_trait]
pub trait BaseIdentityResolver: Send + Sync {
    /// Resolve a credential token to a store identity, or None if unknown.
    async fn resolve(&self, token: &str) -> Result<Option<Identity>>;
}

// =============================================================================
// Platform Credential Validator Trait (Infrastructure)
// =============================================================================

#[async_trait]
pub trait BasePlatformValidator: Send + Sync {
    /// Validate store credentials against the platform's admin API.
    ///
    /// Returns Ok(false) when the platform rejects the credentials; Err only
    /// for transport-level failures.
    async fn validate(&self, platform: &str, credentials: &serde_json::Value) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_stages_enables_everything() {
        let stages = PipelineStages::all();
        assert!(stages.hard_categories);
        assert!(stages.soft_categories);
        assert!(stages.types);
        assert!(stages.variants);
        assert!(stages.embeddings);
        assert!(stages.descriptions);
    }

    #[test]
    fn soft_categories_only_disables_other_stages() {
        let stages = PipelineStages::soft_categories_only();
        assert!(stages.soft_categories);
        assert!(!stages.hard_categories);
        assert!(!stages.types);
        assert!(!stages.variants);
        assert!(!stages.embeddings);
        assert!(!stages.descriptions);
    }
}
