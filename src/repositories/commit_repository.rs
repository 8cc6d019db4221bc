use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::entities::{Commit, RepositoryId};
use crate::error::KoditResult;

#[derive(Clone)]
pub struct CommitRepository {
    pool: SqlitePool,
}

impl CommitRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn upsert(&self, commit: &Commit) -> KoditResult<()> {
        sqlx::query(
            "INSERT INTO commits (repository_id, sha, parent_sha, author, author_email, date, message)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(repository_id, sha) DO NOTHING",
        )
        .bind(commit.repository_id.0.to_string())
        .bind(&commit.sha)
        .bind(&commit.parent_sha)
        .bind(&commit.author)
        .bind(&commit.author_email)
        .bind(commit.date.to_rfc3339())
        .bind(&commit.message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn is_indexed(&self, repository_id: RepositoryId, sha: &str) -> KoditResult<bool> {
        let row = sqlx::query("SELECT 1 FROM commits WHERE repository_id = ?1 AND sha = ?2")
            .bind(repository_id.0.to_string())
            .bind(sha)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    pub async fn list_for_repository(&self, repository_id: RepositoryId) -> KoditResult<Vec<Commit>> {
        let rows = sqlx::query("SELECT * FROM commits WHERE repository_id = ?1 ORDER BY date DESC")
            .bind(repository_id.0.to_string())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|row| {
                let id: String = row.get("repository_id");
                let date: String = row.get("date");
                Commit {
                    repository_id: RepositoryId(Uuid::parse_str(&id).unwrap_or_else(|_| Uuid::nil())),
                    sha: row.get("sha"),
                    parent_sha: row.get("parent_sha"),
                    author: row.get("author"),
                    author_email: row.get("author_email"),
                    date: chrono::DateTime::parse_from_rfc3339(&date)
                        .map(|dt| dt.with_timezone(&Utc))
                        .unwrap_or_else(|_| Utc::now()),
                    message: row.get("message"),
                }
            })
            .collect())
    }
}
