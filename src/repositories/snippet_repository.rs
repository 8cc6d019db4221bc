use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::entities::{RepositoryId, Snippet, SnippetId};
use crate::error::KoditResult;

#[derive(Clone)]
pub struct SnippetRepository {
    pool: SqlitePool,
}

impl SnippetRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Full replace of a commit's snippet set — re-extracting a commit is
    /// idempotent (spec §3 lifecycle, §4.8 algorithm step 4).
    pub async fn replace_for_commit(
        &self,
        repository_id: RepositoryId,
        commit_sha: &str,
        snippets: &[Snippet],
    ) -> KoditResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM snippets WHERE repository_id = ?1 AND commit_sha = ?2")
            .bind(repository_id.0.to_string())
            .bind(commit_sha)
            .execute(&mut *tx)
            .await?;

        for snippet in snippets {
            sqlx::query(
                "INSERT INTO snippets (id, repository_id, commit_sha, file_path, language, text, enrichment_summary)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET text = excluded.text",
            )
            .bind(snippet.id.to_hex())
            .bind(repository_id.0.to_string())
            .bind(commit_sha)
            .bind(&snippet.file_path)
            .bind(&snippet.language)
            .bind(&snippet.text)
            .bind(&snippet.enrichment_summary)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Every tracked repository's live corpus — the snippets belonging to
    /// each repository's current `tracked_head` commit (spec §4.3: BM25 is
    /// rebuilt from "committed snippet texts of one repository's tracked
    /// head", across every repository sharing the one on-disk index, not
    /// just the commit that was just extracted).
    pub async fn list_at_tracked_heads(&self) -> KoditResult<Vec<Snippet>> {
        let rows = sqlx::query(
            "SELECT s.* FROM snippets s
             JOIN repositories r ON r.id = s.repository_id AND r.tracked_head = s.commit_sha",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_snippet).collect())
    }

    pub async fn get_by_ids(&self, ids: &[SnippetId]) -> KoditResult<Vec<Snippet>> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(row) = sqlx::query("SELECT * FROM snippets WHERE id = ?1")
                .bind(id.to_hex())
                .fetch_optional(&self.pool)
                .await?
            {
                out.push(row_to_snippet(&row));
            }
        }
        Ok(out)
    }

    pub async fn set_enrichment_summary(&self, id: SnippetId, summary: &str) -> KoditResult<()> {
        sqlx::query("UPDATE snippets SET enrichment_summary = ?1 WHERE id = ?2")
            .bind(summary)
            .bind(id.to_hex())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn row_to_snippet(row: &sqlx::sqlite::SqliteRow) -> Snippet {
    let repository_id: String = row.get("repository_id");
    let id_hex: String = row.get("id");
    Snippet {
        id: parse_snippet_id(&id_hex),
        repository_id: RepositoryId(Uuid::parse_str(&repository_id).unwrap_or_else(|_| Uuid::nil())),
        commit_sha: row.get("commit_sha"),
        file_path: row.get("file_path"),
        language: row.get("language"),
        text: row.get("text"),
        enrichment_summary: row.get("enrichment_summary"),
    }
}

fn parse_snippet_id(hex: &str) -> SnippetId {
    let mut bytes = [0u8; 32];
    for (i, chunk) in hex.as_bytes().chunks(2).enumerate().take(32) {
        if let Ok(s) = std::str::from_utf8(chunk) {
            if let Ok(byte) = u8::from_str_radix(s, 16) {
                bytes[i] = byte;
            }
        }
    }
    SnippetId(bytes)
}
