//! Store onboarding route.

use axum::extract::Extension;
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use super::error::ApiError;
use crate::domains::stores::{onboard, start_reprocess, OnboardRequest, StartOutcome};
use crate::kernel::jobs::ReprocessOptions;
use crate::server::app::AppState;

/// Onboarding response; credentials are never echoed back.
#[derive(Serialize)]
pub struct OnboardResponse {
    pub resource_key: String,
    pub platform: String,
    pub categories: Vec<String>,
    pub soft_categories: Vec<String>,
    pub product_types: Vec<String>,
    pub sync_mode: String,
    pub first_completed_at: Option<DateTime<Utc>>,
}

/// Extract the bearer token from the Authorization header, handling both
/// "Bearer <token>" and a raw token.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let auth_str = headers.get("authorization")?.to_str().ok()?;
    Some(auth_str.strip_prefix("Bearer ").unwrap_or(auth_str))
}

/// Onboard or re-onboard a store, then hand off to the reprocess runner.
pub async fn onboard_handler(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    Json(request): Json<OnboardRequest>,
) -> Result<Json<OnboardResponse>, ApiError> {
    let token = bearer_token(&headers);

    let saved = onboard(token, request, &state.kernel).await?;

    // Handoff: kick off a full reprocessing run for the freshly saved
    // configuration. The caller polls the job status route for progress.
    match start_reprocess(
        state.kernel.clone(),
        &saved.resource_key,
        ReprocessOptions::default(),
    )
    .await
    {
        Ok(StartOutcome::Started { total }) => {
            tracing::info!(
                resource_key = %saved.resource_key,
                total,
                "Onboarding reprocess started"
            );
        }
        Ok(StartOutcome::AlreadyRunning) => {
            warn!(
                resource_key = %saved.resource_key,
                "Onboarding completed while a reprocess was already running"
            );
        }
        Err(e) => {
            // The configuration is saved either way; surface the run failure
            // through logs and the status route.
            warn!(
                resource_key = %saved.resource_key,
                error = %format!("{:#}", e),
                "Failed to start onboarding reprocess"
            );
        }
    }

    Ok(Json(OnboardResponse {
        resource_key: saved.resource_key,
        platform: saved.platform,
        categories: saved.categories,
        soft_categories: saved.soft_categories,
        product_types: saved.product_types,
        sync_mode: saved.sync_mode,
        first_completed_at: saved.first_completed_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_with_prefix() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer tok_123".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("tok_123"));
    }

    #[test]
    fn bearer_token_without_prefix() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "tok_123".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("tok_123"));
    }

    #[test]
    fn bearer_token_missing_header() {
        let headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
    }
}
