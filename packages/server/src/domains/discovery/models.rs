//! Discovery domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A mined candidate classification term with usage metadata, awaiting
/// promotion into a store's active category set.
///
/// Appended to by the query-analysis path; consumed here. Keyed by term in
/// the store configuration's `potential_categories` map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotentialCategoryObservation {
    /// Number of times the term was observed
    pub count: i64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// Bounded sample of source queries, informational only
    #[serde(default)]
    pub example_queries: Vec<String>,
}

/// Skip reasons recorded on per-store outcomes.
pub const SKIP_NO_NEW_TERMS: &str = "no_new_terms";
pub const SKIP_NO_SUITABLE_TERMS: &str = "no_suitable_terms";
pub const SKIP_RUN_IN_PROGRESS: &str = "run_in_progress";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryStatus {
    Success,
    Skipped,
    Error,
}

/// Result of processing one store in a discovery run.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryOutcome {
    pub resource_key: String,
    pub status: DiscoveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub selected_terms: Vec<String>,
    pub previous_count: usize,
    pub new_count: usize,
}

impl DiscoveryOutcome {
    pub fn success(
        resource_key: &str,
        selected_terms: Vec<String>,
        previous_count: usize,
        new_count: usize,
    ) -> Self {
        Self {
            resource_key: resource_key.to_string(),
            status: DiscoveryStatus::Success,
            reason: None,
            selected_terms,
            previous_count,
            new_count,
        }
    }

    pub fn skipped(resource_key: &str, reason: &str, category_count: usize) -> Self {
        Self {
            resource_key: resource_key.to_string(),
            status: DiscoveryStatus::Skipped,
            reason: Some(reason.to_string()),
            selected_terms: Vec::new(),
            previous_count: category_count,
            new_count: category_count,
        }
    }

    pub fn error(resource_key: &str, reason: String, category_count: usize) -> Self {
        Self {
            resource_key: resource_key.to_string(),
            status: DiscoveryStatus::Error,
            reason: Some(reason),
            selected_terms: Vec::new(),
            previous_count: category_count,
            new_count: category_count,
        }
    }
}

/// Accumulated result of one discovery run across all stores.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscoverySummary {
    pub scanned: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub outcomes: Vec<DiscoveryOutcome>,
}

impl DiscoverySummary {
    pub fn record(&mut self, outcome: DiscoveryOutcome) {
        self.scanned += 1;
        match outcome.status {
            DiscoveryStatus::Success => self.succeeded += 1,
            DiscoveryStatus::Skipped => self.skipped += 1,
            DiscoveryStatus::Error => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_by_status() {
        let mut summary = DiscoverySummary::default();
        summary.record(DiscoveryOutcome::success("a", vec!["t".to_string()], 1, 2));
        summary.record(DiscoveryOutcome::skipped("b", SKIP_NO_NEW_TERMS, 3));
        summary.record(DiscoveryOutcome::error("c", "boom".to_string(), 0));

        assert_eq!(summary.scanned, 3);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.outcomes.len(), 3);
    }

    #[test]
    fn skipped_outcome_keeps_category_count() {
        let outcome = DiscoveryOutcome::skipped("a", SKIP_RUN_IN_PROGRESS, 4);
        assert_eq!(outcome.previous_count, 4);
        assert_eq!(outcome.new_count, 4);
        assert!(outcome.selected_terms.is_empty());
    }
}
