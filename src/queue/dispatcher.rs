//! Durable priority task queue (spec §4.6, §5). Grounded on the original's
//! `application/services/queue_service.py` (dedup-key upsert) and
//! `task_dispatcher.py` (handler lookup by task-type), translated into a
//! `sqlx`-backed claim-by-delete worker loop — the worker loop itself,
//! backoff computation, and transactional claim aren't shown in the
//! original (only the enqueue/dispatch halves are), so they're written
//! directly from spec §4.6/§5's algorithm description.
//!
//! Claim strategy: delete-and-run (at-most-once), the simpler of spec §5's
//! two permitted strategies (DESIGN.md records this as the chosen
//! resolution of that open question).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use sqlx::{Row, SqlitePool};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::application::config::configuration::Configuration;
use crate::application::Application;
use crate::domain::entities::{Task, TaskType};
use crate::error::{KoditError, KoditResult};

use super::task::{backoff_seconds, next_retry_at, TaskHandler};

pub struct Dispatcher {
    pool: SqlitePool,
    #[allow(dead_code)]
    config: Configuration,
    handlers: RwLock<HashMap<TaskType, Arc<dyn TaskHandler>>>,
}

impl Dispatcher {
    pub fn new(pool: SqlitePool, config: Configuration) -> Self {
        Self {
            pool,
            config,
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Registers the handler for a task type. Unknown types at dispatch
    /// time are a fatal, non-retried error (spec §4.6) rather than runtime
    /// registration from outside the core (spec §9).
    pub async fn register_handler(&self, task_type: TaskType, handler: Arc<dyn TaskHandler>) {
        self.handlers.write().await.insert(task_type, handler);
    }

    /// Enqueue semantics (spec §3 invariant 3, §4.6): a row with the same
    /// dedup-key has its priority and payload updated in place; otherwise a
    /// new row is inserted.
    pub async fn enqueue(&self, task: Task) -> KoditResult<()> {
        sqlx::query(
            "INSERT INTO tasks (dedup_key, task_type, priority, payload, created_at, retry_count, next_retry_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, NULL)
             ON CONFLICT(dedup_key) DO UPDATE SET
                priority = excluded.priority,
                payload = excluded.payload",
        )
        .bind(&task.dedup_key)
        .bind(task.task_type.as_str())
        .bind(task.priority)
        .bind(task.payload.to_string())
        .bind(task.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Claims the highest-priority eligible task (ties broken oldest-first)
    /// by deleting its row inside the same transaction as the select — at-
    /// most-once execution per row (spec §5).
    async fn claim_next(&self) -> KoditResult<Option<Task>> {
        let mut tx = self.pool.begin().await?;
        let now = chrono::Utc::now().to_rfc3339();

        let row = sqlx::query(
            "SELECT * FROM tasks
             WHERE next_retry_at IS NULL OR next_retry_at <= ?1
             ORDER BY priority DESC, created_at ASC
             LIMIT 1",
        )
        .bind(&now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.commit().await?;
            return Ok(None);
        };

        let dedup_key: String = row.get("dedup_key");
        sqlx::query("DELETE FROM tasks WHERE dedup_key = ?1")
            .bind(&dedup_key)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        let task_type_str: String = row.get("task_type");
        let Some(task_type) = TaskType::parse(&task_type_str) else {
            warn!(task_type = %task_type_str, "dropping task of unknown type");
            return Ok(None);
        };
        let payload: String = row.get("payload");
        let created_at: String = row.get("created_at");

        Ok(Some(Task {
            dedup_key,
            task_type,
            priority: row.get("priority"),
            payload: serde_json::from_str(&payload)?,
            created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .unwrap_or_else(|_| chrono::Utc::now()),
            retry_count: row.get::<i64, _>("retry_count") as u32,
            next_retry_at: None,
        }))
    }

    /// Counts tasks still queued whose dedup-key references `needle` (an id
    /// embedded at enqueue time, e.g. a repository id) — backs the "pending
    /// tasks" half of a status summary (spec §3/§4.9 ADD).
    pub async fn count_pending_matching(&self, needle: &str) -> KoditResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM tasks WHERE dedup_key LIKE ?1")
            .bind(format!("%{needle}%"))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("count"))
    }

    async fn reinsert_with_backoff(&self, mut task: Task) -> KoditResult<()> {
        task.retry_count += 1;
        let delay = backoff_seconds(task.retry_count);
        sqlx::query(
            "INSERT INTO tasks (dedup_key, task_type, priority, payload, created_at, retry_count, next_retry_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(dedup_key) DO UPDATE SET retry_count = excluded.retry_count, next_retry_at = excluded.next_retry_at",
        )
        .bind(&task.dedup_key)
        .bind(task.task_type.as_str())
        .bind(task.priority)
        .bind(task.payload.to_string())
        .bind(task.created_at.to_rfc3339())
        .bind(task.retry_count as i64)
        .bind(next_retry_at(task.retry_count).to_rfc3339())
        .execute(&self.pool)
        .await?;
        info!(dedup_key = %task.dedup_key, retry_count = task.retry_count, delay_seconds = delay, "task re-queued after failure");
        Ok(())
    }

    async fn dispatch_one(&self, app: &Application, task: Task) -> KoditResult<()> {
        let handler = {
            let handlers = self.handlers.read().await;
            handlers.get(&task.task_type).cloned()
        };
        let Some(handler) = handler else {
            return Err(KoditError::Fatal(format!("no handler registered for {:?}", task.task_type)));
        };

        match handler.handle(app, &task.payload).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_retryable() && task.retry_count < task.task_type.max_retries() => {
                self.reinsert_with_backoff(task).await?;
                Ok(())
            }
            Err(err) => {
                error!(dedup_key = %task.dedup_key, error = %err, "task dropped after exhausting retries or fatal error");
                Err(err)
            }
        }
    }

    /// Runs `worker_count` polling loops until `cancellation` fires.
    pub async fn run_workers(self: Arc<Self>, app: Application, worker_count: usize, cancellation: CancellationToken) {
        let mut handles = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let dispatcher = Arc::clone(&self);
            let app = app.clone();
            let cancellation = cancellation.clone();
            handles.push(tokio::spawn(async move {
                dispatcher.worker_loop(worker_id, app, cancellation).await;
            }));
        }
        for handle in handles {
            let _ = handle.await;
        }
    }

    async fn worker_loop(&self, worker_id: usize, app: Application, cancellation: CancellationToken) {
        loop {
            if cancellation.is_cancelled() {
                return;
            }
            match self.claim_next().await {
                Ok(Some(task)) => {
                    if let Err(err) = self.dispatch_one(&app, task).await {
                        error!(worker_id, error = %err, "task handler failed");
                    }
                }
                Ok(None) => {
                    tokio::select! {
                        _ = tokio::time::sleep(Duration::from_millis(500)) => {}
                        _ = cancellation.cancelled() => return,
                    }
                }
                Err(err) => {
                    error!(worker_id, error = %err, "failed to claim next task");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }
}
