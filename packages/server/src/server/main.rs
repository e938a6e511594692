// Main entry point for the Storewise API server

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use server_core::domains::discovery::DiscoveryConfig;
use server_core::kernel::jobs::{PostgresJobStatusStore, PostgresSentinel};
use server_core::kernel::{
    scheduled_tasks::start_scheduler, HttpClassifier, HttpPlatformValidator, OpenAiRankingOracle,
    PostgresIdentityResolver, ServerKernel,
};
use server_core::{server::build_app, Config};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Storewise API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    // Build kernel
    let kernel = Arc::new(ServerKernel::new(
        pool.clone(),
        Arc::new(HttpClassifier::new(config.classifier_url.clone())),
        Arc::new(OpenAiRankingOracle::new(
            &config.openai_api_key,
            config.openai_model.clone(),
        )),
        Arc::new(PostgresIdentityResolver::new(pool.clone())),
        Arc::new(HttpPlatformValidator::new()),
        Arc::new(PostgresJobStatusStore::new(pool.clone())),
        Arc::new(PostgresSentinel::new(pool.clone())),
    ));

    let discovery = DiscoveryConfig {
        max_terms: config.discovery_max_terms,
        store_delay: Duration::from_secs(config.discovery_store_delay_secs),
    };

    // Start scheduled tasks (daily category discovery)
    let _scheduler = start_scheduler(kernel.clone(), discovery.clone(), config.discovery_hour_utc)
        .await
        .context("Failed to start scheduler")?;

    // Build application
    let app = build_app(kernel, discovery);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
