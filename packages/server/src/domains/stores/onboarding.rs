//! Onboarding and re-onboarding merge logic.
//!
//! A request either configures a store for the first time (complete payload
//! required) or updates a stored configuration (stored values are defaults,
//! payload fields override). Array-valued fields override, never merge: the
//! discovery engine's union in `domains/discovery` is the only place the
//! category set grows incrementally.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use super::models::StoreConfiguration;
use crate::kernel::{Platform, ServerKernel};

pub const VALID_SYNC_MODES: &[&str] = &["full", "image", "metadata"];

/// Onboarding errors surfaced to the boundary with a specific reason
#[derive(Error, Debug)]
pub enum OnboardingError {
    #[error("Missing required field for first-time onboarding: {0}")]
    MissingField(&'static str),

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("Invalid sync mode: {0}")]
    InvalidSyncMode(String),

    #[error("Platform rejected the provided credentials")]
    CredentialsRejected,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Onboarding request payload. Every field is optional at the type level;
/// which ones are required depends on whether a stored configuration exists.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OnboardRequest {
    pub resource_key: Option<String>,
    pub platform: Option<String>,
    pub credentials: Option<serde_json::Value>,
    pub categories: Option<Vec<String>>,
    pub soft_categories: Option<Vec<String>>,
    pub product_types: Option<Vec<String>>,
    pub sync_mode: Option<String>,
}

/// Resolve a request against the stored configuration, if any.
///
/// First-time path (no stored config): resource key, platform, credentials,
/// categories and product types are all required. Re-onboarding path: stored
/// values are the defaults and any field present in the payload overrides
/// them wholesale. The first-run marker is carried over when already set and
/// stamped now otherwise, so it is only ever set once.
pub fn merge_request(
    stored: Option<&StoreConfiguration>,
    request: &OnboardRequest,
    now: DateTime<Utc>,
) -> Result<StoreConfiguration, OnboardingError> {
    let resource_key = match stored {
        Some(config) => config.resource_key.clone(),
        None => request
            .resource_key
            .clone()
            .ok_or(OnboardingError::MissingField("resource_key"))?,
    };

    let platform = request
        .platform
        .clone()
        .or_else(|| stored.map(|c| c.platform.clone()))
        .ok_or(OnboardingError::MissingField("platform"))?;
    if Platform::parse(&platform).is_none() {
        return Err(OnboardingError::UnknownPlatform(platform));
    }

    let credentials = request
        .credentials
        .clone()
        .or_else(|| stored.map(|c| c.credentials.clone()))
        .ok_or(OnboardingError::MissingField("credentials"))?;

    let categories = request
        .categories
        .clone()
        .or_else(|| stored.map(|c| c.categories.clone()))
        .ok_or(OnboardingError::MissingField("categories"))?;

    let product_types = request
        .product_types
        .clone()
        .or_else(|| stored.map(|c| c.product_types.clone()))
        .ok_or(OnboardingError::MissingField("product_types"))?;

    let soft_categories = request
        .soft_categories
        .clone()
        .or_else(|| stored.map(|c| c.soft_categories.clone()))
        .unwrap_or_default();

    let sync_mode = request
        .sync_mode
        .clone()
        .or_else(|| stored.map(|c| c.sync_mode.clone()))
        .unwrap_or_else(|| "full".to_string());
    if !VALID_SYNC_MODES.contains(&sync_mode.as_str()) {
        return Err(OnboardingError::InvalidSyncMode(sync_mode));
    }

    Ok(StoreConfiguration {
        resource_key,
        platform,
        credentials,
        categories,
        soft_categories,
        product_types,
        sync_mode,
        potential_categories: stored
            .map(|c| c.potential_categories.clone())
            .unwrap_or_else(|| sqlx::types::Json(Default::default())),
        first_completed_at: stored
            .and_then(|c| c.first_completed_at)
            .or(Some(now)),
        created_at: stored.map(|c| c.created_at).unwrap_or(now),
        updated_at: now,
    })
}

/// Onboard or re-onboard a store.
///
/// Resolves the bearer token to an identity, merges the payload over any
/// stored configuration, validates the platform credentials before any state
/// mutation, and upserts. The caller hands off to the reprocess runner after
/// a successful return.
pub async fn onboard(
    bearer_token: Option<&str>,
    request: OnboardRequest,
    kernel: &ServerKernel,
) -> Result<StoreConfiguration, OnboardingError> {
    let identity = match bearer_token {
        Some(token) => kernel.identity_resolver.resolve(token).await?,
        None => None,
    };

    // A resolved identity pins the resource key even before any
    // configuration exists for it.
    let mut request = request;
    if request.resource_key.is_none() {
        if let Some(identity) = &identity {
            request.resource_key = Some(identity.resource_key.clone());
        }
    }

    let stored = match &identity {
        Some(identity) => {
            StoreConfiguration::find_by_resource_key(&identity.resource_key, &kernel.db_pool)
                .await?
        }
        None => None,
    };

    let first_time = stored.is_none();
    let merged = merge_request(stored.as_ref(), &request, Utc::now())?;

    let valid = kernel
        .platform_validator
        .validate(&merged.platform, &merged.credentials)
        .await?;
    if !valid {
        return Err(OnboardingError::CredentialsRejected);
    }

    let saved = merged.upsert(&kernel.db_pool).await?;

    info!(
        resource_key = %saved.resource_key,
        platform = %saved.platform,
        first_time,
        "Store onboarded"
    );

    Ok(saved)
}
