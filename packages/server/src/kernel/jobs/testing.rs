//! In-memory job orchestration doubles for tests.
//!
//! These mirror the Postgres-backed implementations closely enough that the
//! runner and discovery tests exercise the real orchestration logic without a
//! database.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;

use super::sentinel::CancellationSentinel;
use super::status::{RunState, RunStatus};
use super::status_store::JobStatusStore;

/// One recorded `set_state` call, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateWrite {
    pub state: RunState,
    pub progress: i32,
    pub done: i32,
    pub total: i32,
}

/// In-memory status store recording every write for assertions.
#[derive(Default)]
pub struct InMemoryJobStatusStore {
    records: Mutex<HashMap<String, RunStatus>>,
    history: Mutex<HashMap<String, Vec<StateWrite>>>,
}

impl InMemoryJobStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All `set_state` writes observed for a resource key, in order.
    pub fn writes(&self, resource_key: &str) -> Vec<StateWrite> {
        self.history
            .lock()
            .unwrap()
            .get(resource_key)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl JobStatusStore for InMemoryJobStatusStore {
    async fn set_state(
        &self,
        resource_key: &str,
        state: RunState,
        progress: i32,
        done: i32,
        total: i32,
    ) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        let entry = records
            .entry(resource_key.to_string())
            .or_insert_with(|| RunStatus::idle(resource_key));

        // A fresh run clears the previous run's logs, like the SQL upsert.
        if state == RunState::Running && entry.state != RunState::Running {
            entry.logs.clear();
            entry.started_at = Some(Utc::now());
            entry.finished_at = None;
        }
        if state.is_terminal() {
            entry.finished_at = Some(Utc::now());
        }
        entry.state = state;
        entry.progress = progress;
        entry.done = done;
        entry.total = total;
        entry.updated_at = Utc::now();

        self.history
            .lock()
            .unwrap()
            .entry(resource_key.to_string())
            .or_default()
            .push(StateWrite {
                state,
                progress,
                done,
                total,
            });

        Ok(())
    }

    async fn get_state(&self, resource_key: &str) -> Result<RunStatus> {
        let records = self.records.lock().unwrap();
        Ok(records
            .get(resource_key)
            .cloned()
            .unwrap_or_else(|| RunStatus::idle(resource_key)))
    }

    async fn append_log(&self, resource_key: &str, message: &str) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        if let Some(entry) = records.get_mut(resource_key) {
            entry.logs.push(message.to_string());
            entry.updated_at = Utc::now();
        }
        Ok(())
    }
}

/// In-memory sentinel with optional read-failure injection.
#[derive(Default)]
pub struct InMemorySentinel {
    armed: Mutex<HashSet<String>>,
    fail_reads: AtomicBool,
}

impl InMemorySentinel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `is_armed` calls fail, to exercise the runner's
    /// "cannot determine cancellation" policy.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CancellationSentinel for InMemorySentinel {
    async fn arm(&self, resource_key: &str) -> Result<()> {
        self.armed.lock().unwrap().insert(resource_key.to_string());
        Ok(())
    }

    async fn is_armed(&self, resource_key: &str) -> Result<bool> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(anyhow!("sentinel store unavailable"));
        }
        Ok(self.armed.lock().unwrap().contains(resource_key))
    }

    async fn disarm(&self, resource_key: &str) -> Result<bool> {
        Ok(self.armed.lock().unwrap().remove(resource_key))
    }
}
