//! Category discovery: mining potential-category observations into the
//! active category set.

mod engine;
mod models;
mod scorer;

pub use engine::{
    candidate_observations, filter_selection, merge_categories, remaining_observations,
    DiscoveryConfig, DiscoveryEngine, TermSelector,
};
pub use models::{
    DiscoveryOutcome, DiscoveryStatus, DiscoverySummary, PotentialCategoryObservation,
    SKIP_NO_NEW_TERMS, SKIP_NO_SUITABLE_TERMS, SKIP_RUN_IN_PROGRESS,
};
pub use scorer::{score_observation, select_top};
