use sqlx::{Row, SqlitePool};

use crate::domain::entities::{StepState, TaskStatus};
use crate::error::KoditResult;

#[derive(Clone)]
pub struct TaskStatusRepository {
    pool: SqlitePool,
}

impl TaskStatusRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Writes a `TaskStatus` row keyed on the step's trackable reference
    /// (spec §4.7). A step never regresses out of a terminal state (spec §3
    /// invariant 4) — callers are expected to only call this on genuine
    /// state transitions, enforced by the in-process `Step` arena.
    pub async fn upsert(&self, status: &TaskStatus) -> KoditResult<()> {
        sqlx::query(
            "INSERT INTO task_status (trackable_type, trackable_id, name, state, current, total, message, error)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(trackable_type, trackable_id, name) DO UPDATE SET
                state = excluded.state,
                current = excluded.current,
                total = excluded.total,
                message = excluded.message,
                error = excluded.error",
        )
        .bind(&status.trackable_type)
        .bind(&status.trackable_id)
        .bind(&status.name)
        .bind(state_str(status.state))
        .bind(status.current as i64)
        .bind(status.total as i64)
        .bind(&status.message)
        .bind(&status.error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_for_trackable(&self, trackable_type: &str, trackable_id: &str) -> KoditResult<Vec<TaskStatus>> {
        let rows = sqlx::query("SELECT * FROM task_status WHERE trackable_type = ?1 AND trackable_id = ?2")
            .bind(trackable_type)
            .bind(trackable_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|row| TaskStatus {
                trackable_type: row.get("trackable_type"),
                trackable_id: row.get("trackable_id"),
                name: row.get("name"),
                state: parse_state(&row.get::<String, _>("state")),
                current: row.get::<i64, _>("current") as u64,
                total: row.get::<i64, _>("total") as u64,
                message: row.get("message"),
                error: row.get("error"),
            })
            .collect())
    }
}

fn state_str(state: StepState) -> &'static str {
    match state {
        StepState::Started => "started",
        StepState::InProgress => "in_progress",
        StepState::Completed => "completed",
        StepState::Skipped => "skipped",
        StepState::Failed => "failed",
    }
}

fn parse_state(s: &str) -> StepState {
    match s {
        "started" => StepState::Started,
        "in_progress" => StepState::InProgress,
        "completed" => StepState::Completed,
        "skipped" => StepState::Skipped,
        _ => StepState::Failed,
    }
}
