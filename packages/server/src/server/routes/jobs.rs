//! Reprocess job routes: start, poll status, fetch logs, request stop.
//!
//! Start is fire-and-forget: the response returns as soon as the run is
//! spawned and the caller polls the status route. Every terminal state stays
//! queryable after the triggering request has returned.

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::ApiError;
use crate::domains::stores::models::StoreConfiguration;
use crate::domains::stores::{request_stop, start_reprocess, StartOutcome};
use crate::kernel::jobs::{ReprocessOptions, RunState};
use crate::server::app::AppState;

#[derive(Serialize)]
pub struct StartReprocessResponse {
    pub resource_key: String,
    pub state: RunState,
    pub total: usize,
}

#[derive(Serialize)]
pub struct ReprocessStatusResponse {
    pub resource_key: String,
    pub state: RunState,
    pub progress: i32,
    pub done: i32,
    pub total: i32,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct ReprocessLogsResponse {
    pub resource_key: String,
    pub state: RunState,
    pub progress: i32,
    pub logs: Vec<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct StopReprocessResponse {
    pub resource_key: String,
    /// False when the run was already stopped or never started
    pub stopped: bool,
}

/// Start a full reprocessing run for a store
pub async fn start_reprocess_handler(
    Extension(state): Extension<AppState>,
    Path(resource_key): Path<String>,
) -> Result<(StatusCode, Json<StartReprocessResponse>), ApiError> {
    let config =
        StoreConfiguration::find_by_resource_key(&resource_key, &state.kernel.db_pool).await?;
    if config.is_none() {
        return Err(ApiError::not_found(format!(
            "no store configuration for {}",
            resource_key
        )));
    }

    match start_reprocess(
        state.kernel.clone(),
        &resource_key,
        ReprocessOptions::default(),
    )
    .await?
    {
        StartOutcome::AlreadyRunning => Err(ApiError::conflict(format!(
            "a reprocessing run for {} is already in progress",
            resource_key
        ))),
        StartOutcome::Started { total } => Ok((
            StatusCode::ACCEPTED,
            Json(StartReprocessResponse {
                resource_key,
                state: RunState::Running,
                total,
            }),
        )),
    }
}

/// Poll the current run status for a store
pub async fn reprocess_status_handler(
    Extension(state): Extension<AppState>,
    Path(resource_key): Path<String>,
) -> Result<Json<ReprocessStatusResponse>, ApiError> {
    let status = state.kernel.status_store.get_state(&resource_key).await?;

    Ok(Json(ReprocessStatusResponse {
        resource_key: status.resource_key,
        state: status.state,
        progress: status.progress,
        done: status.done,
        total: status.total,
        started_at: status.started_at,
        finished_at: status.finished_at,
        updated_at: status.updated_at,
    }))
}

/// Fetch the current run's logs for a store
pub async fn reprocess_logs_handler(
    Extension(state): Extension<AppState>,
    Path(resource_key): Path<String>,
) -> Result<Json<ReprocessLogsResponse>, ApiError> {
    let status = state.kernel.status_store.get_state(&resource_key).await?;

    Ok(Json(ReprocessLogsResponse {
        resource_key: status.resource_key,
        state: status.state,
        progress: status.progress,
        logs: status.logs,
        started_at: status.started_at,
        finished_at: status.finished_at,
        updated_at: status.updated_at,
    }))
}

/// Request a stop for a store's run; idempotent
pub async fn stop_reprocess_handler(
    Extension(state): Extension<AppState>,
    Path(resource_key): Path<String>,
) -> Result<Json<StopReprocessResponse>, ApiError> {
    let stopped = request_stop(&state.kernel, &resource_key).await?;

    Ok(Json(StopReprocessResponse {
        resource_key,
        stopped,
    }))
}
