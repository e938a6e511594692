//! Deterministic fallback scorer for candidate terms.
//!
//! Used whenever the ranking oracle is unavailable or errors. The arithmetic
//! and the tie-breaking (stable sort, input order wins) are part of the
//! contract: given the same observations, two runs select the same terms.

use chrono::{DateTime, Utc};

use super::models::PotentialCategoryObservation;

/// Score one observation at a given point in time.
///
/// `recency` rewards terms seen in the last 100 days, `persistence` rewards
/// terms observed across a long window, and raw count dominates at weight
/// 0.5.
pub fn score_observation(obs: &PotentialCategoryObservation, now: DateTime<Utc>) -> f64 {
    let days_since_last = (now - obs.last_seen).num_days().max(0) as f64;
    let recency = (100.0 - days_since_last).max(0.0);

    let observed_window_days = (obs.last_seen - obs.first_seen).num_days().max(0) as f64;
    let persistence = (observed_window_days * 2.0).min(100.0);

    0.5 * obs.count as f64 + 0.3 * recency + 0.2 * persistence
}

/// Select the top `max_terms` candidates by descending score.
///
/// The sort is stable, so candidates with equal scores keep their input
/// order.
pub fn select_top(
    candidates: &[(String, PotentialCategoryObservation)],
    max_terms: usize,
    now: DateTime<Utc>,
) -> Vec<String> {
    let mut scored: Vec<(&str, f64)> = candidates
        .iter()
        .map(|(term, obs)| (term.as_str(), score_observation(obs, now)))
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    scored
        .into_iter()
        .take(max_terms)
        .map(|(term, _)| term.to_string())
        .collect()
}
