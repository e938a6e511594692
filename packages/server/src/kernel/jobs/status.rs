//! Run status model for background reprocessing.
//!
//! One row per resource key, holding the lifecycle state of the (at most one)
//! reprocessing run for that store. This is current status, not an audit
//! trail: every write is a point-in-time snapshot of the latest run.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

// ============================================================================
// Run state
// ============================================================================

/// Lifecycle state of a reprocessing run.
///
/// Transitions: idle -> running -> {done, error, stopped}; running -> running
/// for progress updates. Terminal states return to running only via a new
/// start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "run_state", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Done,
    Error,
    Stopped,
}

impl RunState {
    /// Returns true if the run has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Error | RunState::Stopped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Done => "done",
            RunState::Error => "error",
            RunState::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Run status model
// ============================================================================

#[derive(FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct RunStatus {
    pub resource_key: String,
    pub state: RunState,
    /// 0-100
    pub progress: i32,
    pub done: i32,
    pub total: i32,
    /// Append-only within a run; reset when a new run starts
    pub logs: Vec<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl RunStatus {
    /// The synthesized default for a store that has never run a job.
    ///
    /// Absence of a row is a valid idle state, never an error.
    pub fn idle(resource_key: &str) -> Self {
        Self {
            resource_key: resource_key.to_string(),
            state: RunState::Idle,
            progress: 0,
            done: 0,
            total: 0,
            logs: Vec::new(),
            started_at: None,
            finished_at: None,
            updated_at: Utc::now(),
        }
    }

    /// Fetch the current status row, if any.
    pub async fn fetch(resource_key: &str, pool: &PgPool) -> Result<Option<Self>> {
        let status = sqlx::query_as::<_, Self>(
            "SELECT * FROM reprocess_runs WHERE resource_key = $1",
        )
        .bind(resource_key)
        .fetch_optional(pool)
        .await?;
        Ok(status)
    }

    /// Upsert the status snapshot for a resource key.
    ///
    /// A transition into `running` from any other state starts a fresh run:
    /// logs are cleared and `started_at` is stamped. Terminal states stamp
    /// `finished_at`. Every write overwrites `updated_at`.
    pub async fn upsert_state(
        resource_key: &str,
        state: RunState,
        progress: i32,
        done: i32,
        total: i32,
        pool: &PgPool,
    ) -> Result<()> {
        let started_at = if state == RunState::Running {
            Some(Utc::now())
        } else {
            None
        };
        let finished_at = if state.is_terminal() {
            Some(Utc::now())
        } else {
            None
        };

        sqlx::query(
            r#"
            INSERT INTO reprocess_runs (
                resource_key, state, progress, done, total, logs,
                started_at, finished_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, '{}', $6, $7, NOW())
            ON CONFLICT (resource_key) DO UPDATE SET
                state = EXCLUDED.state,
                progress = EXCLUDED.progress,
                done = EXCLUDED.done,
                total = EXCLUDED.total,
                logs = CASE
                    WHEN EXCLUDED.state = 'running'::run_state
                         AND reprocess_runs.state <> 'running'::run_state
                    THEN '{}'::TEXT[]
                    ELSE reprocess_runs.logs
                END,
                started_at = CASE
                    WHEN EXCLUDED.state = 'running'::run_state
                         AND reprocess_runs.state <> 'running'::run_state
                    THEN EXCLUDED.started_at
                    ELSE reprocess_runs.started_at
                END,
                finished_at = EXCLUDED.finished_at,
                updated_at = NOW()
            "#,
        )
        .bind(resource_key)
        .bind(state)
        .bind(progress)
        .bind(done)
        .bind(total)
        .bind(started_at)
        .bind(finished_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Append a log line without touching any other field.
    pub async fn push_log(resource_key: &str, message: &str, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE reprocess_runs
            SET logs = array_append(logs, $2),
                updated_at = NOW()
            WHERE resource_key = $1
            "#,
        )
        .bind(resource_key)
        .bind(message)
        .execute(pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_default_has_zeroed_counters() {
        let status = RunStatus::idle("store-1");
        assert_eq!(status.state, RunState::Idle);
        assert_eq!(status.progress, 0);
        assert_eq!(status.done, 0);
        assert_eq!(status.total, 0);
        assert!(status.logs.is_empty());
        assert!(status.started_at.is_none());
        assert!(status.finished_at.is_none());
    }

    #[test]
    fn terminal_states() {
        assert!(RunState::Done.is_terminal());
        assert!(RunState::Error.is_terminal());
        assert!(RunState::Stopped.is_terminal());
        assert!(!RunState::Idle.is_terminal());
        assert!(!RunState::Running.is_terminal());
    }

    #[test]
    fn state_round_trips_through_display() {
        for state in [
            RunState::Idle,
            RunState::Running,
            RunState::Done,
            RunState::Error,
            RunState::Stopped,
        ] {
            assert_eq!(state.to_string(), state.as_str());
        }
    }
}
