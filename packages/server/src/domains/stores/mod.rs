//! Stores domain: configuration, onboarding, and reprocess actions.

pub mod models;
pub mod onboarding;
pub mod reprocess;

pub use onboarding::{merge_request, onboard, OnboardRequest, OnboardingError};
pub use reprocess::{request_stop, start_reprocess, StartOutcome};
