// TestDependencies - mock implementations for testing
//
// Provides mock collaborators that can be injected into ServerKernel (or
// used standalone) for tests. All of them record their calls and can be
// scripted with queued responses.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use uuid::Uuid;

use super::{
    BaseClassifier, BaseIdentityResolver, BasePlatformValidator, BaseRankingOracle, Identity,
    PipelineStages, RankCandidate,
};

// =============================================================================
// Mock Classifier
// =============================================================================

/// Arguments captured from a process call
#[derive(Debug, Clone)]
pub struct ProcessCallArgs {
    pub product_id: Uuid,
    pub stages: PipelineStages,
}

pub struct MockClassifier {
    calls: Arc<Mutex<Vec<ProcessCallArgs>>>,
    failing_ids: Arc<Mutex<Vec<Uuid>>>,
}

impl MockClassifier {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            failing_ids: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make processing of a specific product fail
    pub fn with_failure_for(self, product_id: Uuid) -> Self {
        self.failing_ids.lock().unwrap().push(product_id);
        self
    }

    /// Get all process calls with their arguments
    pub fn calls(&self) -> Vec<ProcessCallArgs> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of items processed so far
    pub fn processed_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseClassifier for MockClassifier {
    async fn process(&self, product_id: Uuid, stages: &PipelineStages) -> Result<()> {
        self.calls.lock().unwrap().push(ProcessCallArgs {
            product_id,
            stages: *stages,
        });

        if self.failing_ids.lock().unwrap().contains(&product_id) {
            return Err(anyhow!("classification failed for product {}", product_id));
        }

        Ok(())
    }
}

// =============================================================================
// Mock Ranking Oracle
// =============================================================================

/// Arguments captured from a rank call
#[derive(Debug, Clone)]
pub struct RankCallArgs {
    pub candidates: Vec<String>,
    pub existing: Vec<String>,
    pub max_terms: usize,
}

pub struct MockRankingOracle {
    responses: Arc<Mutex<Vec<Vec<String>>>>,
    calls: Arc<Mutex<Vec<RankCallArgs>>>,
    unavailable: Arc<Mutex<bool>>,
}

impl MockRankingOracle {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            unavailable: Arc::new(Mutex::new(false)),
        }
    }

    /// Queue a selection to be returned
    pub fn with_selection(self, terms: Vec<&str>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push(terms.into_iter().map(String::from).collect());
        self
    }

    /// Make every rank call fail, as an unreachable oracle would
    pub fn unavailable(self) -> Self {
        *self.unavailable.lock().unwrap() = true;
        self
    }

    /// Get all rank calls with their arguments
    pub fn calls(&self) -> Vec<RankCallArgs> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockRankingOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRankingOracle for MockRankingOracle {
    async fn rank(
        &self,
        candidates: &[RankCandidate],
        existing: &[String],
        max_terms: usize,
    ) -> Result<Vec<String>> {
        self.calls.lock().unwrap().push(RankCallArgs {
            candidates: candidates.iter().map(|c| c.term.clone()).collect(),
            existing: existing.to_vec(),
            max_terms,
        });

        if *self.unavailable.lock().unwrap() {
            return Err(anyhow!("ranking oracle unavailable"));
        }

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(Vec::new())
        } else {
            Ok(responses.remove(0))
        }
    }
}

// =============================================================================
// Mock Identity Resolver
// =============================================================================

pub struct MockIdentityResolver {
    identities: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockIdentityResolver {
    pub fn new() -> Self {
        Self {
            identities: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register a token that resolves to a resource key
    pub fn with_token(self, token: &str, resource_key: &str) -> Self {
        self.identities
            .lock()
            .unwrap()
            .push((token.to_string(), resource_key.to_string()));
        self
    }
}

impl Default for MockIdentityResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseIdentityResolver for MockIdentityResolver {
    async fn resolve(&self, token: &str) -> Result<Option<Identity>> {
        let identities = self.identities.lock().unwrap();
        Ok(identities
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, resource_key)| Identity {
                resource_key: resource_key.clone(),
            }))
    }
}

// =============================================================================
// Mock Platform Validator
// =============================================================================

pub struct MockPlatformValidator {
    accept: Arc<Mutex<bool>>,
    validate_calls: Arc<AtomicUsize>,
}

impl MockPlatformValidator {
    pub fn new() -> Self {
        Self {
            accept: Arc::new(Mutex::new(true)),
            validate_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make validation reject all credentials
    pub fn rejecting(self) -> Self {
        *self.accept.lock().unwrap() = false;
        self
    }

    /// Number of validation calls made
    pub fn call_count(&self) -> usize {
        self.validate_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockPlatformValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BasePlatformValidator for MockPlatformValidator {
    async fn validate(&self, _platform: &str, _credentials: &serde_json::Value) -> Result<bool> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        Ok(*self.accept.lock().unwrap())
    }
}
