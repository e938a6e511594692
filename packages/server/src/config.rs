use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub openai_api_key: String,
    pub openai_model: Option<String>,
    pub classifier_url: String,
    /// Hour of day (UTC) at which the daily category discovery run fires
    pub discovery_hour_utc: u32,
    /// Delay between stores within one discovery run (ranking oracle rate limit)
    pub discovery_store_delay_secs: u64,
    /// Maximum number of new terms promoted per store per discovery run
    pub discovery_max_terms: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let discovery_hour_utc: u32 = env::var("DISCOVERY_HOUR_UTC")
            .unwrap_or_else(|_| "3".to_string())
            .parse()
            .context("DISCOVERY_HOUR_UTC must be a valid hour")?;
        if discovery_hour_utc > 23 {
            anyhow::bail!("DISCOVERY_HOUR_UTC must be between 0 and 23");
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            openai_api_key: env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY must be set")?,
            openai_model: env::var("OPENAI_MODEL").ok(),
            classifier_url: env::var("CLASSIFIER_URL")
                .unwrap_or_else(|_| "http://localhost:8091".to_string()),
            discovery_hour_utc,
            discovery_store_delay_secs: env::var("DISCOVERY_STORE_DELAY_SECS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .context("DISCOVERY_STORE_DELAY_SECS must be a valid number")?,
            discovery_max_terms: env::var("DISCOVERY_MAX_TERMS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("DISCOVERY_MAX_TERMS must be a valid number")?,
        })
    }
}
