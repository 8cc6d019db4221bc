use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::entities::{Repository, RepositoryId, TrackingRef};
use crate::error::KoditResult;

#[derive(Clone)]
pub struct RepositoryRepository {
    pool: SqlitePool,
}

impl RepositoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn upsert(&self, repo: &Repository) -> KoditResult<()> {
        let tracking_ref = serde_json::to_string(&repo.tracking_ref)?;
        sqlx::query(
            "INSERT INTO repositories (id, uri, cloned_path, tracking_ref, tracked_head, last_scanned_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                cloned_path = excluded.cloned_path,
                tracking_ref = excluded.tracking_ref,
                tracked_head = excluded.tracked_head,
                last_scanned_at = excluded.last_scanned_at",
        )
        .bind(repo.id.0.to_string())
        .bind(&repo.uri)
        .bind(&repo.cloned_path)
        .bind(tracking_ref)
        .bind(&repo.tracked_head)
        .bind(repo.last_scanned_at.map(|t| t.to_rfc3339()))
        .bind(repo.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_by_uri(&self, uri: &str) -> KoditResult<Option<Repository>> {
        let row = sqlx::query("SELECT * FROM repositories WHERE uri = ?1")
            .bind(uri)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| row_to_repository(&r)))
    }

    pub async fn get(&self, id: RepositoryId) -> KoditResult<Option<Repository>> {
        let row = sqlx::query("SELECT * FROM repositories WHERE id = ?1")
            .bind(id.0.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| row_to_repository(&r)))
    }

    pub async fn list(&self) -> KoditResult<Vec<Repository>> {
        let rows = sqlx::query("SELECT * FROM repositories ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_repository).collect())
    }

    /// Cascades to commits, files, snippets, embeddings via `ON DELETE
    /// CASCADE` (spec §3 lifecycle: explicit delete cascades everything).
    pub async fn delete(&self, id: RepositoryId) -> KoditResult<()> {
        sqlx::query("DELETE FROM repositories WHERE id = ?1")
            .bind(id.0.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn row_to_repository(row: &sqlx::sqlite::SqliteRow) -> Repository {
    let id: String = row.get("id");
    let tracking_ref: String = row.get("tracking_ref");
    let created_at: String = row.get("created_at");
    let last_scanned_at: Option<String> = row.get("last_scanned_at");

    Repository {
        id: RepositoryId(Uuid::parse_str(&id).unwrap_or_else(|_| Uuid::nil())),
        uri: row.get("uri"),
        cloned_path: row.get("cloned_path"),
        tracking_ref: serde_json::from_str::<TrackingRef>(&tracking_ref)
            .unwrap_or(TrackingRef::LatestTag),
        tracked_head: row.get("tracked_head"),
        last_scanned_at: last_scanned_at.and_then(|s| {
            chrono::DateTime::parse_from_rfc3339(&s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        }),
        created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    }
}
