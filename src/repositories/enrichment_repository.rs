use sqlx::SqlitePool;

use crate::domain::entities::SnippetId;
use crate::error::KoditResult;

#[derive(Clone)]
pub struct EnrichmentRepository {
    pool: SqlitePool,
}

impl EnrichmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn upsert(&self, snippet_id: SnippetId, summary: &str) -> KoditResult<()> {
        sqlx::query(
            "INSERT INTO enrichments (snippet_id, summary) VALUES (?1, ?2)
             ON CONFLICT(snippet_id) DO UPDATE SET summary = excluded.summary",
        )
        .bind(snippet_id.to_hex())
        .bind(summary)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn any_exist(&self) -> KoditResult<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM enrichments LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}
