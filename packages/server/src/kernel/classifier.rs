// Classification pipeline client
//
// The pipeline itself is a separate service; this is the infrastructure
// implementation of BaseClassifier that hands one product at a time to it,
// with per-stage enable flags.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use super::{BaseClassifier, PipelineStages};

#[derive(Debug, Serialize)]
struct ProcessRequest<'a> {
    product_id: Uuid,
    stages: &'a PipelineStages,
}

/// HTTP client for the classification pipeline service
pub struct HttpClassifier {
    client: reqwest::Client,
    base_url: String,
}

impl HttpClassifier {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl BaseClassifier for HttpClassifier {
    async fn process(&self, product_id: Uuid, stages: &PipelineStages) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/process", self.base_url))
            .json(&ProcessRequest { product_id, stages })
            .send()
            .await
            .context("Failed to reach classification pipeline")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "classification pipeline returned {} for product {}: {}",
                status,
                product_id,
                body
            );
        }

        Ok(())
    }
}
