use sqlx::SqlitePool;

use crate::domain::entities::{File, RepositoryId};
use crate::error::KoditResult;

#[derive(Clone)]
pub struct FileRepository {
    pool: SqlitePool,
}

impl FileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn replace_for_commit(
        &self,
        repository_id: RepositoryId,
        commit_sha: &str,
        files: &[File],
    ) -> KoditResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM files WHERE repository_id = ?1 AND commit_sha = ?2")
            .bind(repository_id.0.to_string())
            .bind(commit_sha)
            .execute(&mut *tx)
            .await?;

        for file in files {
            sqlx::query(
                "INSERT INTO files (repository_id, commit_sha, path, content_sha256, mime, size, author_name, author_email)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .bind(repository_id.0.to_string())
            .bind(commit_sha)
            .bind(&file.path)
            .bind(&file.content_sha256)
            .bind(&file.mime)
            .bind(file.size as i64)
            .bind(&file.author_name)
            .bind(&file.author_email)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
