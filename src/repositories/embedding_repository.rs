//! Embedding storage as a JSON array in the relational store (spec §4.4):
//! "Vectors may live in the same relational store (JSON array) or an
//! external vector engine; the repository abstraction hides this."

use sqlx::{Row, SqlitePool};

use crate::domain::entities::{EmbeddingKind, SnippetId};
use crate::error::KoditResult;
use crate::search::vector::cosine_distance;

#[derive(Clone)]
pub struct EmbeddingRepository {
    pool: SqlitePool,
}

impl EmbeddingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn kind_str(kind: EmbeddingKind) -> &'static str {
        match kind {
            EmbeddingKind::Code => "code",
            EmbeddingKind::Text => "text",
        }
    }

    /// Embeddings are keyed by snippet content hash, shared across commits
    /// with identical content (spec §3 invariant 1).
    pub async fn create_embedding(&self, snippet_id: SnippetId, kind: EmbeddingKind, vector: &[f32]) -> KoditResult<()> {
        let json = serde_json::to_string(vector)?;
        sqlx::query(
            "INSERT INTO embeddings (snippet_id, kind, vector) VALUES (?1, ?2, ?3)
             ON CONFLICT(snippet_id, kind) DO UPDATE SET vector = excluded.vector",
        )
        .bind(snippet_id.to_hex())
        .bind(Self::kind_str(kind))
        .bind(json)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn exists(&self, snippet_id: SnippetId, kind: EmbeddingKind) -> KoditResult<bool> {
        let row = sqlx::query("SELECT 1 FROM embeddings WHERE snippet_id = ?1 AND kind = ?2")
            .bind(snippet_id.to_hex())
            .bind(Self::kind_str(kind))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Cosine-distance k-NN over the embedding store (spec §4.4), ascending
    /// by distance (most similar first).
    pub async fn list_semantic_results(
        &self,
        kind: EmbeddingKind,
        query_vector: &[f32],
        top_k: usize,
    ) -> KoditResult<Vec<(SnippetId, f32)>> {
        let rows = sqlx::query("SELECT snippet_id, vector FROM embeddings WHERE kind = ?1")
            .bind(Self::kind_str(kind))
            .fetch_all(&self.pool)
            .await?;

        let mut scored: Vec<(SnippetId, f32)> = rows
            .iter()
            .filter_map(|row| {
                let id_hex: String = row.get("snippet_id");
                let vector_json: String = row.get("vector");
                let vector: Vec<f32> = serde_json::from_str(&vector_json).ok()?;
                Some((parse_hex_id(&id_hex), 1.0 - cosine_distance(query_vector, &vector)))
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }
}

fn parse_hex_id(hex: &str) -> SnippetId {
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
