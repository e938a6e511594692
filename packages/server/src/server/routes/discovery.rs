//! Manual trigger for the category discovery engine.

use axum::extract::Extension;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::domains::discovery::DiscoveryEngine;
use crate::server::app::AppState;

#[derive(Serialize)]
pub struct TriggerDiscoveryResponse {
    pub status: String,
}

/// Trigger a discovery run out-of-band.
///
/// Fire-and-forget: the engine completes asynchronously and reports through
/// logs; the response only acknowledges the trigger.
pub async fn trigger_discovery_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<TriggerDiscoveryResponse>) {
    let engine = DiscoveryEngine::new(state.kernel.clone(), state.discovery.clone());

    tokio::spawn(async move {
        match engine.run().await {
            Ok(summary) => {
                tracing::info!(
                    scanned = summary.scanned,
                    succeeded = summary.succeeded,
                    skipped = summary.skipped,
                    failed = summary.failed,
                    "Manual category discovery finished"
                );
            }
            Err(e) => {
                tracing::error!("Manual category discovery failed: {}", e);
            }
        }
    });

    (
        StatusCode::ACCEPTED,
        Json(TriggerDiscoveryResponse {
            status: "accepted".to_string(),
        }),
    )
}
