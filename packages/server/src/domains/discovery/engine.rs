//! Category discovery engine.
//!
//! Runs once per scheduled tick (or on manual trigger): scans every store
//! with accumulated potential-category observations, selects the best new
//! terms (ranking oracle first, deterministic scorer as fallback), merges the
//! winners into the store's active category set, and triggers a narrow
//! incremental reprocessing pass that recomputes soft categories only.
//!
//! Stores are processed strictly one at a time with a fixed delay in between
//! to respect the ranking oracle's rate limits. A failure on one store is
//! recorded and the engine moves on; only a failure to list stores at all is
//! fatal to the run.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{error, info, warn};

use super::models::{
    DiscoveryOutcome, DiscoverySummary, PotentialCategoryObservation, SKIP_NO_NEW_TERMS,
    SKIP_NO_SUITABLE_TERMS, SKIP_RUN_IN_PROGRESS,
};
use super::scorer::select_top;
use crate::domains::stores::models::{Product, StoreConfiguration};
use crate::kernel::jobs::{ReprocessOptions, ReprocessRunner, RunState};
use crate::kernel::{BaseRankingOracle, RankCandidate, ServerKernel};

/// Tuning for one discovery run.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Maximum number of terms promoted per store per run
    pub max_terms: usize,
    /// Delay between stores (ranking oracle rate limit)
    pub store_delay: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_terms: 5,
            store_delay: Duration::from_secs(2),
        }
    }
}

/// Picks new terms for one store: oracle first, deterministic scorer on
/// oracle failure, and an unconditional validation pass over whatever came
/// back.
pub struct TermSelector {
    oracle: Arc<dyn BaseRankingOracle>,
    max_terms: usize,
}

impl TermSelector {
    pub fn new(oracle: Arc<dyn BaseRankingOracle>, max_terms: usize) -> Self {
        Self { oracle, max_terms }
    }

    pub async fn select(
        &self,
        candidates: &[(String, PotentialCategoryObservation)],
        existing: &[String],
    ) -> Vec<String> {
        let rank_candidates: Vec<RankCandidate> = candidates
            .iter()
            .map(|(term, obs)| RankCandidate {
                term: term.clone(),
                count: obs.count,
                first_seen: obs.first_seen,
                last_seen: obs.last_seen,
                example_queries: obs.example_queries.clone(),
            })
            .collect();

        let raw = match self
            .oracle
            .rank(&rank_candidates, existing, self.max_terms)
            .await
        {
            Ok(terms) => terms,
            Err(e) => {
                warn!(error = %e, "ranking oracle unavailable, using deterministic scorer");
                select_top(candidates, self.max_terms, Utc::now())
            }
        };

        filter_selection(raw, candidates, existing, self.max_terms)
    }
}

/// The oracle is advisory: drop terms already in the active set, terms that
/// are not actually candidates, and duplicates; cap at `max_terms`.
pub fn filter_selection(
    raw: Vec<String>,
    candidates: &[(String, PotentialCategoryObservation)],
    existing: &[String],
    max_terms: usize,
) -> Vec<String> {
    let candidate_set: HashSet<&str> = candidates.iter().map(|(term, _)| term.as_str()).collect();
    let existing_set: HashSet<&str> = existing.iter().map(String::as_str).collect();

    let mut kept: Vec<String> = Vec::new();
    for term in raw {
        if kept.len() == max_terms {
            break;
        }
        if existing_set.contains(term.as_str()) {
            continue;
        }
        if !candidate_set.contains(term.as_str()) {
            continue;
        }
        if kept.iter().any(|k| k == &term) {
            continue;
        }
        kept.push(term);
    }
    kept
}

/// Set union: every selected term appended once, existing terms untouched.
/// Running the merge twice with the same input is a no-op the second time.
pub fn merge_categories(existing: &[String], selected: &[String]) -> Vec<String> {
    let mut merged = existing.to_vec();
    for term in selected {
        if !merged.iter().any(|t| t == term) {
            merged.push(term.clone());
        }
    }
    merged
}

/// Observations for terms not yet in the active category set, in stable
/// (lexicographic) order.
pub fn candidate_observations(
    store: &StoreConfiguration,
) -> Vec<(String, PotentialCategoryObservation)> {
    let existing: HashSet<&str> = store.categories.iter().map(String::as_str).collect();
    store
        .potential_categories
        .iter()
        .filter(|(term, _)| !existing.contains(term.as_str()))
        .map(|(term, obs)| (term.clone(), obs.clone()))
        .collect()
}

/// Observations left behind after promotion: everything except the selected
/// terms. Unpromoted observations stay and may win a later run.
pub fn remaining_observations(
    observations: &BTreeMap<String, PotentialCategoryObservation>,
    selected: &[String],
) -> BTreeMap<String, PotentialCategoryObservation> {
    observations
        .iter()
        .filter(|(term, _)| !selected.iter().any(|s| s == *term))
        .map(|(term, obs)| (term.clone(), obs.clone()))
        .collect()
}

/// The discovery engine itself.
pub struct DiscoveryEngine {
    kernel: Arc<ServerKernel>,
    config: DiscoveryConfig,
}

impl DiscoveryEngine {
    pub fn new(kernel: Arc<ServerKernel>, config: DiscoveryConfig) -> Self {
        Self { kernel, config }
    }

    /// Run discovery across all stores with observations.
    ///
    /// Only the initial store listing is fatal; per-store failures are
    /// recorded in the summary and the run continues.
    pub async fn run(&self) -> Result<DiscoverySummary> {
        info!("Running category discovery");

        let stores = StoreConfiguration::find_with_observations(&self.kernel.db_pool)
            .await
            .context("failed to list stores with potential category observations")?;

        let mut summary = DiscoverySummary::default();

        if stores.is_empty() {
            info!("No stores with potential category observations");
            return Ok(summary);
        }

        let store_count = stores.len();
        info!(stores = store_count, "Found stores with observations");

        for (idx, store) in stores.into_iter().enumerate() {
            let resource_key = store.resource_key.clone();
            let category_count = store.categories.len();

            let outcome = match self.process_store(&store).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(
                        resource_key = %resource_key,
                        error = %format!("{:#}", e),
                        "Discovery failed for store"
                    );
                    DiscoveryOutcome::error(&resource_key, format!("{:#}", e), category_count)
                }
            };
            summary.record(outcome);

            // One store at a time, with a gap, to bound the oracle call rate.
            if idx + 1 < store_count {
                tokio::time::sleep(self.config.store_delay).await;
            }
        }

        info!(
            scanned = summary.scanned,
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            failed = summary.failed,
            "Category discovery finished"
        );

        Ok(summary)
    }

    async fn process_store(&self, store: &StoreConfiguration) -> Result<DiscoveryOutcome> {
        let resource_key = store.resource_key.as_str();

        // A store mid-reprocess keeps its observations for the next tick.
        let status = self.kernel.status_store.get_state(resource_key).await?;
        if status.state == RunState::Running {
            info!(resource_key = %resource_key, "Reprocess in flight, skipping store");
            return Ok(DiscoveryOutcome::skipped(
                resource_key,
                SKIP_RUN_IN_PROGRESS,
                store.categories.len(),
            ));
        }

        let candidates = candidate_observations(store);
        if candidates.is_empty() {
            return Ok(DiscoveryOutcome::skipped(
                resource_key,
                SKIP_NO_NEW_TERMS,
                store.categories.len(),
            ));
        }

        let selector = TermSelector::new(self.kernel.ranking_oracle.clone(), self.config.max_terms);
        let selected = selector.select(&candidates, &store.categories).await;
        if selected.is_empty() {
            return Ok(DiscoveryOutcome::skipped(
                resource_key,
                SKIP_NO_SUITABLE_TERMS,
                store.categories.len(),
            ));
        }

        info!(
            resource_key = %resource_key,
            terms = ?selected,
            "Promoting discovered categories"
        );

        let previous_count = store.categories.len();
        let merged = merge_categories(&store.categories, &selected);
        let new_count = merged.len();
        let remaining = remaining_observations(&store.potential_categories, &selected);

        StoreConfiguration::apply_discovery_merge(
            resource_key,
            &merged,
            &remaining,
            &self.kernel.db_pool,
        )
        .await
        .context("failed to persist merged categories")?;

        // Narrow incremental pass: recompute soft categories only, leaving
        // embeddings and the rest of the pipeline untouched.
        let items = Product::ids_for_store(resource_key, &self.kernel.db_pool).await?;
        let runner = ReprocessRunner::new(
            self.kernel.status_store.clone(),
            self.kernel.sentinel.clone(),
            self.kernel.classifier.clone(),
        );
        runner
            .run(resource_key, &items, &ReprocessOptions::incremental())
            .await
            .context("incremental reprocess failed")?;

        Ok(DiscoveryOutcome::success(
            resource_key,
            selected,
            previous_count,
            new_count,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn obs(count: i64) -> PotentialCategoryObservation {
        PotentialCategoryObservation {
            count,
            first_seen: Utc::now(),
            last_seen: Utc::now(),
            example_queries: Vec::new(),
        }
    }

    #[test]
    fn merge_is_union_and_idempotent() {
        let existing = vec!["a".to_string(), "b".to_string()];
        let selected = vec!["b".to_string(), "c".to_string()];

        let merged = merge_categories(&existing, &selected);
        assert_eq!(merged, vec!["a", "b", "c"]);

        // Same selection again: nothing duplicated, nothing removed.
        let merged_again = merge_categories(&merged, &selected);
        assert_eq!(merged_again, merged);
    }

    #[test]
    fn filter_drops_terms_already_active() {
        let candidates = vec![("new1".to_string(), obs(2))];
        let existing = vec!["existing1".to_string()];

        let kept = filter_selection(
            vec!["new1".to_string(), "existing1".to_string()],
            &candidates,
            &existing,
            5,
        );
        assert_eq!(kept, vec!["new1"]);
    }

    #[test]
    fn filter_drops_hallucinated_terms_and_duplicates() {
        let candidates = vec![("real".to_string(), obs(2))];

        let kept = filter_selection(
            vec![
                "real".to_string(),
                "invented".to_string(),
                "real".to_string(),
            ],
            &candidates,
            &[],
            5,
        );
        assert_eq!(kept, vec!["real"]);
    }

    #[test]
    fn filter_caps_at_max_terms() {
        let candidates: Vec<_> = (0..10).map(|i| (format!("t{}", i), obs(1))).collect();
        let raw: Vec<String> = (0..10).map(|i| format!("t{}", i)).collect();

        let kept = filter_selection(raw, &candidates, &[], 3);
        assert_eq!(kept, vec!["t0", "t1", "t2"]);
    }

    #[test]
    fn remaining_observations_drop_promoted_terms_only() {
        let mut observations = BTreeMap::new();
        observations.insert("promoted".to_string(), obs(5));
        observations.insert("kept".to_string(), obs(1));

        let remaining = remaining_observations(&observations, &["promoted".to_string()]);
        assert_eq!(remaining.len(), 1);
        assert!(remaining.contains_key("kept"));
    }
}
