//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::domains::discovery::DiscoveryConfig;
use crate::kernel::ServerKernel;
use crate::server::routes::{
    health_handler, onboard_handler, reprocess_logs_handler, reprocess_status_handler,
    start_reprocess_handler, stop_reprocess_handler, trigger_discovery_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub kernel: Arc<ServerKernel>,
    pub discovery: DiscoveryConfig,
}

/// Build the axum application
pub fn build_app(kernel: Arc<ServerKernel>, discovery: DiscoveryConfig) -> Router {
    let state = AppState { kernel, discovery };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/stores/onboard", post(onboard_handler))
        .route(
            "/api/stores/:resource_key/reprocess",
            post(start_reprocess_handler),
        )
        .route(
            "/api/stores/:resource_key/reprocess/status",
            get(reprocess_status_handler),
        )
        .route(
            "/api/stores/:resource_key/reprocess/logs",
            get(reprocess_logs_handler),
        )
        .route(
            "/api/stores/:resource_key/reprocess/stop",
            post(stop_reprocess_handler),
        )
        .route("/api/discovery/run", post(trigger_discovery_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
