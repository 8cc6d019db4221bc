//! Retrieval orchestrator (spec §4.9): keyword + dual-vector search fused
//! by reciprocal rank, grounded on the original's `retreival/service.py`
//! for the overall resolve-then-search shape, generalised to the
//! three-list fused form spec §9 resolves as authoritative.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::entities::{EmbeddingKind, RepositoryId, SnippetId};
use crate::error::KoditResult;
use crate::repositories::{EmbeddingRepository, EnrichmentRepository, RepositoryRepository, SnippetRepository};
use crate::search::vector::EmbeddingProvider;
use crate::search::{reciprocal_rank_fusion, Bm25Index};

/// Each candidate list contributes up to `FANOUT_MULTIPLIER * limit`
/// results before fusion narrows back down to `limit` (spec §4.9 step 2:
/// "BM25 top-N=4*limit").
const FANOUT_MULTIPLIER: usize = 4;

#[derive(Debug, Clone, Serialize)]
pub struct ScoredSnippet {
    pub snippet_id: String,
    pub repository_id: uuid::Uuid,
    pub file_path: String,
    pub language: String,
    pub text: String,
    pub fused_score: f64,
    /// Per-method scores that contributed to the fused rank (spec §4.9:
    /// "materialize ... with ... per-method scores").
    pub original_scores: HashMap<String, f64>,
}

pub struct RetrievalApplication {
    repositories: RepositoryRepository,
    snippets: SnippetRepository,
    embeddings: EmbeddingRepository,
    enrichments: EnrichmentRepository,
    bm25: Arc<Bm25Index>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
}

impl RetrievalApplication {
    pub fn new(
        repositories: RepositoryRepository,
        snippets: SnippetRepository,
        embeddings: EmbeddingRepository,
        enrichments: EnrichmentRepository,
        bm25: Arc<Bm25Index>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            repositories,
            snippets,
            embeddings,
            enrichments,
            bm25,
            embedding_provider,
        }
    }

    /// Steps (spec §4.9): resolve repository scope, gather BM25 and vector
    /// candidate lists (adding the enrichment-text list only once
    /// enrichments exist), fuse by reciprocal rank, break ties by BM25
    /// score then snippet id, and materialize the top `limit`.
    pub async fn search(&self, query: &str, repo_uri: Option<&str>, limit: usize) -> KoditResult<Vec<ScoredSnippet>> {
        let scope = self.resolve_scope(repo_uri).await?;
        let fanout = limit.saturating_mul(FANOUT_MULTIPLIER).max(limit);

        let bm25_hits = self.bm25.search(query, fanout);
        let bm25_scores: HashMap<SnippetId, f32> = bm25_hits.iter().copied().collect();
        let bm25_ranked: Vec<SnippetId> = bm25_hits.iter().map(|(id, _)| *id).collect();

        let query_vectors = self.embedding_provider.embed_batch(vec![(SnippetId([0u8; 32]), query.to_owned())]).await?;
        let query_vector = query_vectors.into_iter().next().map(|(_, v)| v).unwrap_or_default();

        let code_hits = self
            .embeddings
            .list_semantic_results(EmbeddingKind::Code, &query_vector, fanout)
            .await?;
        let code_ranked: Vec<SnippetId> = code_hits.iter().map(|(id, _)| *id).collect();

        let has_enrichments = self.enrichments.any_exist().await?;
        let (text_hits, text_ranked) = if has_enrichments {
            let hits = self
                .embeddings
                .list_semantic_results(EmbeddingKind::Text, &query_vector, fanout)
                .await?;
            let ranked = hits.iter().map(|(id, _)| *id).collect();
            (hits, ranked)
        } else {
            (Vec::new(), Vec::new())
        };

        let lists: Vec<Vec<SnippetId>> = if has_enrichments {
            vec![bm25_ranked, code_ranked, text_ranked]
        } else {
            vec![bm25_ranked, code_ranked]
        };
        let fused = reciprocal_rank_fusion(&lists, crate::search::fusion::RRF_K);

        let code_scores: HashMap<SnippetId, f32> = code_hits.into_iter().collect();
        let text_scores: HashMap<SnippetId, f32> = text_hits.into_iter().collect();

        let mut ranked: Vec<(SnippetId, f64)> = fused.into_iter().collect();
        ranked.sort_by(|(id_a, score_a), (id_b, score_b)| {
            score_b
                .partial_cmp(score_a)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    let a = bm25_scores.get(id_a).copied().unwrap_or(0.0);
                    let b = bm25_scores.get(id_b).copied().unwrap_or(0.0);
                    b.partial_cmp(&a).unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| id_a.to_hex().cmp(&id_b.to_hex()))
        });

        let ids: Vec<SnippetId> = ranked.iter().map(|(id, _)| *id).collect();
        let snippets = self.snippets.get_by_ids(&ids).await?;
        let snippets_by_id: HashMap<SnippetId, _> = snippets.into_iter().map(|s| (s.id, s)).collect();

        // Filter by scope before truncating so an in-scope result past the
        // fanout's first `limit` slots isn't dropped in favor of an
        // out-of-scope one ranked higher.
        ranked.retain(|(id, _)| match (scope, snippets_by_id.get(id)) {
            (Some(repository_id), Some(snippet)) => snippet.repository_id == repository_id,
            (Some(_), None) => false,
            (None, _) => true,
        });
        ranked.truncate(limit);

        let mut results = Vec::with_capacity(ranked.len());
        for (id, fused_score) in ranked {
            let Some(snippet) = snippets_by_id.get(&id) else {
                continue;
            };
            let mut original_scores = HashMap::new();
            if let Some(score) = bm25_scores.get(&id) {
                original_scores.insert("bm25".to_owned(), *score as f64);
            }
            if let Some(score) = code_scores.get(&id) {
                original_scores.insert("vector_code".to_owned(), *score as f64);
            }
            if let Some(score) = text_scores.get(&id) {
                original_scores.insert("vector_text".to_owned(), *score as f64);
            }

            results.push(ScoredSnippet {
                snippet_id: id.to_hex(),
                repository_id: snippet.repository_id.0,
                file_path: snippet.file_path.clone(),
                language: snippet.language.clone(),
                text: snippet.text.clone(),
                fused_score,
                original_scores,
            });
        }

        Ok(results)
    }

    async fn resolve_scope(&self, repo_uri: Option<&str>) -> KoditResult<Option<RepositoryId>> {
        let Some(uri) = repo_uri else {
            return Ok(None);
        };
        let sanitized = crate::git::sanitize_uri(uri);
        Ok(self.repositories.find_by_uri(&sanitized).await?.map(|r| r.id))
    }
}
