//! End-to-end tests for discovery term selection and merge semantics,
//! exercising the oracle-with-fallback path against mock collaborators.

use std::sync::Arc;

use chrono::{Duration, Utc};

use server_core::domains::discovery::{
    candidate_observations, merge_categories, remaining_observations, PotentialCategoryObservation,
    TermSelector,
};
use server_core::domains::stores::models::StoreConfiguration;
use server_core::kernel::test_dependencies::MockRankingOracle;

fn obs(count: i64, first_days_ago: i64, last_days_ago: i64) -> PotentialCategoryObservation {
    let now = Utc::now();
    PotentialCategoryObservation {
        count,
        first_seen: now - Duration::days(first_days_ago),
        last_seen: now - Duration::days(last_days_ago),
        example_queries: Vec::new(),
    }
}

#[tokio::test]
async fn oracle_terms_overlapping_existing_categories_are_filtered() {
    // Oracle returns ["new1", "existing1"] against existing ["existing1"]:
    // only "new1" survives.
    let oracle = Arc::new(MockRankingOracle::new().with_selection(vec!["new1", "existing1"]));
    let selector = TermSelector::new(oracle, 5);

    let candidates = vec![("new1".to_string(), obs(4, 5, 0))];
    let existing = vec!["existing1".to_string()];

    let selected = selector.select(&candidates, &existing).await;
    assert_eq!(selected, vec!["new1"]);
}

#[tokio::test]
async fn oracle_failure_falls_back_to_deterministic_scorer() {
    let oracle = Arc::new(MockRankingOracle::new().unavailable());
    let selector = TermSelector::new(oracle.clone(), 5);

    let candidates = vec![
        ("b".to_string(), obs(3, 3, 3)),
        ("a".to_string(), obs(10, 10, 0)),
    ];

    let selected = selector.select(&candidates, &[]).await;
    // a scores 39.0, b scores 30.6: the scorer decides the order.
    assert_eq!(selected, vec!["a", "b"]);
    assert_eq!(oracle.calls().len(), 1);
}

#[tokio::test]
async fn fallback_selection_is_reproducible() {
    let candidates = vec![
        ("tied-1".to_string(), obs(2, 0, 0)),
        ("tied-2".to_string(), obs(2, 0, 0)),
        ("winner".to_string(), obs(50, 20, 0)),
    ];

    let mut runs = Vec::new();
    for _ in 0..3 {
        let selector = TermSelector::new(Arc::new(MockRankingOracle::new().unavailable()), 2);
        runs.push(selector.select(&candidates, &[]).await);
    }

    assert_eq!(runs[0], vec!["winner", "tied-1"]);
    assert_eq!(runs[0], runs[1]);
    assert_eq!(runs[1], runs[2]);
}

#[tokio::test]
async fn oracle_hallucinations_are_dropped() {
    let oracle =
        Arc::new(MockRankingOracle::new().with_selection(vec!["vegan snacks", "not a candidate"]));
    let selector = TermSelector::new(oracle, 5);

    let candidates = vec![("vegan snacks".to_string(), obs(4, 5, 0))];

    let selected = selector.select(&candidates, &[]).await;
    assert_eq!(selected, vec!["vegan snacks"]);
}

#[tokio::test]
async fn oracle_overreach_is_capped_at_max_terms() {
    let terms: Vec<String> = (0..8).map(|i| format!("t{}", i)).collect();
    let oracle = Arc::new(
        MockRankingOracle::new().with_selection(terms.iter().map(String::as_str).collect()),
    );
    let selector = TermSelector::new(oracle, 5);

    let candidates: Vec<_> = terms.iter().map(|t| (t.clone(), obs(1, 1, 0))).collect();

    let selected = selector.select(&candidates, &[]).await;
    assert_eq!(selected.len(), 5);
}

#[tokio::test]
async fn oracle_receives_the_existing_category_set() {
    let oracle = Arc::new(MockRankingOracle::new().with_selection(vec!["new1"]));
    let selector = TermSelector::new(oracle.clone(), 5);

    let candidates = vec![("new1".to_string(), obs(4, 5, 0))];
    let existing = vec!["shoes".to_string(), "bags".to_string()];

    selector.select(&candidates, &existing).await;

    let calls = oracle.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].existing, existing);
    assert_eq!(calls[0].max_terms, 5);
    assert_eq!(calls[0].candidates, vec!["new1"]);
}

#[test]
fn running_the_merge_twice_changes_nothing() {
    let existing = vec!["shoes".to_string()];
    let selected = vec!["vegan snacks".to_string(), "cold brew".to_string()];

    let once = merge_categories(&existing, &selected);
    let twice = merge_categories(&once, &selected);

    assert_eq!(once, vec!["shoes", "vegan snacks", "cold brew"]);
    assert_eq!(once, twice);
    // Existing terms are never removed.
    assert!(twice.contains(&"shoes".to_string()));
}

#[test]
fn promoted_terms_stop_being_candidates() {
    let mut store = StoreConfiguration::builder()
        .resource_key("store-1")
        .platform("shopify")
        .credentials(serde_json::json!({}))
        .categories(vec!["shoes".to_string()])
        .build();

    let mut observations = std::collections::BTreeMap::new();
    observations.insert("vegan snacks".to_string(), obs(4, 5, 0));
    observations.insert("cold brew".to_string(), obs(2, 2, 1));
    store.potential_categories = sqlx::types::Json(observations);

    let candidates = candidate_observations(&store);
    assert_eq!(candidates.len(), 2);

    // Promote one term the way the engine does.
    let selected = vec!["vegan snacks".to_string()];
    store.categories = merge_categories(&store.categories, &selected);
    store.potential_categories = sqlx::types::Json(remaining_observations(
        &store.potential_categories,
        &selected,
    ));

    // The next discovery pass no longer sees the promoted term.
    let next_candidates = candidate_observations(&store);
    assert_eq!(next_candidates.len(), 1);
    assert_eq!(next_candidates[0].0, "cold brew");
}

#[test]
fn terms_already_active_are_never_candidates() {
    let mut store = StoreConfiguration::builder()
        .resource_key("store-1")
        .platform("shopify")
        .credentials(serde_json::json!({}))
        .categories(vec!["shoes".to_string()])
        .build();

    let mut observations = std::collections::BTreeMap::new();
    observations.insert("shoes".to_string(), obs(9, 9, 0));
    store.potential_categories = sqlx::types::Json(observations);

    assert!(candidate_observations(&store).is_empty());
}
