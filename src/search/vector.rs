//! Dense vector index (spec §4.4): pluggable embedding provider, token-aware
//! batching, and cosine-distance k-NN over the embedding store.
//!
//! Grounded on the original's `infrastructure/embedding/embedding_providers/
//! batching.py` (`split_sub_batches`) and `openai_embedding_provider.py`;
//! `async-openai` and `tiktoken-rs` are teacher dependencies, reused here
//! for their originally-intended purpose.

use async_trait::async_trait;
use async_openai::{config::OpenAIConfig, types::CreateEmbeddingRequestArgs, Client};

use crate::application::config::configuration::EndpointConfig;
use crate::domain::entities::{EmbeddingKind, SnippetId};
use crate::error::{KoditError, KoditResult};

const DEFAULT_MAX_TOKENS: usize = 8192;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds a batch of `(id, text)` pairs, yielding `(id, vector)` pairs in
    /// the same order. Empty-text inputs are skipped silently (spec §4.4).
    async fn embed_batch(&self, inputs: Vec<(SnippetId, String)>) -> KoditResult<Vec<(SnippetId, Vec<f32>)>>;

    fn dimensions(&self) -> usize;
}

pub struct OpenAiEmbeddingProvider {
    client: Client<OpenAIConfig>,
    model: String,
    dimensions: usize,
    max_tokens: usize,
    max_batch_size: Option<usize>,
}

impl OpenAiEmbeddingProvider {
    pub fn new(config: &EndpointConfig, dimensions: usize) -> KoditResult<Self> {
        let mut openai_config = OpenAIConfig::new();
        if let Some(base_url) = &config.base_url {
            openai_config = openai_config.with_api_base(base_url.clone());
        }
        if let Some(api_key) = &config.api_key {
            openai_config = openai_config.with_api_key(api_key.clone());
        }
        let model = config
            .model
            .clone()
            .unwrap_or_else(|| "text-embedding-3-small".to_owned());

        Ok(Self {
            client: Client::with_config(openai_config),
            model,
            dimensions,
            max_tokens: DEFAULT_MAX_TOKENS,
            max_batch_size: None,
        })
    }

    /// Splits inputs into sub-batches of at most `max_tokens` tokens (as
    /// counted by the provider's tokenizer) and an optional item-count cap,
    /// preserving order (spec §4.4).
    fn split_sub_batches(&self, inputs: &[(SnippetId, String)]) -> Vec<Vec<usize>> {
        let bpe = tiktoken_rs::cl100k_base().expect("cl100k_base tokenizer ships with tiktoken-rs");
        let mut batches = Vec::new();
        let mut current: Vec<usize> = Vec::new();
        let mut current_tokens = 0usize;

        for (i, (_, text)) in inputs.iter().enumerate() {
            if text.is_empty() {
                continue;
            }
            let token_count = bpe.encode_ordinary(text).len();
            let exceeds_size_cap = self
                .max_batch_size
                .map(|cap| current.len() >= cap)
                .unwrap_or(false);

            if !current.is_empty() && (current_tokens + token_count > self.max_tokens || exceeds_size_cap) {
                batches.push(std::mem::take(&mut current));
                current_tokens = 0;
            }
            current.push(i);
            current_tokens += token_count;
        }
        if !current.is_empty() {
            batches.push(current);
        }
        batches
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed_batch(&self, inputs: Vec<(SnippetId, String)>) -> KoditResult<Vec<(SnippetId, Vec<f32>)>> {
        let batches = self.split_sub_batches(&inputs);
        let mut out = Vec::with_capacity(inputs.len());

        for batch in batches {
            let texts: Vec<String> = batch.iter().map(|&i| inputs[i].1.clone()).collect();
            let request = CreateEmbeddingRequestArgs::default()
                .model(&self.model)
                .input(texts)
                .build()
                .map_err(|e| KoditError::Provider(e.to_string()))?;

            let response = self
                .client
                .embeddings()
                .create(request)
                .await
                .map_err(|e| KoditError::Provider(e.to_string()))?;

            for (offset, embedding) in response.data.into_iter().enumerate() {
                let idx = batch[offset];
                let vector: Vec<f32> = embedding.embedding.into_iter().collect();
                out.push((inputs[idx].0, vector));
            }
        }

        Ok(out)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - (dot / (norm_a * norm_b))
}

/// In-memory mirror of the embedding store used for k-NN search. The
/// relational-store vs external-engine choice is hidden behind this type
/// (spec §4.4): a JSON-array-backed sqlx repository populates it on load.
#[derive(Default)]
pub struct VectorIndex {
    entries: Vec<(SnippetId, EmbeddingKind, Vec<f32>)>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, snippet_id: SnippetId, kind: EmbeddingKind, vector: Vec<f32>) {
        self.entries.push((snippet_id, kind, vector));
    }

    /// Cosine-distance k-NN, ascending by distance (most similar first),
    /// spec §4.4.
    pub fn search(&self, kind: EmbeddingKind, query_vector: &[f32], top_k: usize) -> Vec<(SnippetId, f32)> {
        let mut scored: Vec<(SnippetId, f32)> = self
            .entries
            .iter()
            .filter(|(_, entry_kind, _)| *entry_kind == kind)
            .map(|(id, _, vector)| (*id, cosine_distance(query_vector, vector)))
            .collect();

        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(n: u8) -> SnippetId {
        SnippetId([n; 32])
    }

    #[test]
    fn ranks_closer_vector_first() {
        let mut index = VectorIndex::new();
        index.insert(sid(0), EmbeddingKind::Code, vec![1.0, 0.0]);
        index.insert(sid(1), EmbeddingKind::Code, vec![0.0, 1.0]);

        let hits = index.search(EmbeddingKind::Code, &[0.9, 0.1], 2);
        assert_eq!(hits[0].0, sid(0));
    }

    #[test]
    fn filters_by_embedding_kind() {
        let mut index = VectorIndex::new();
        index.insert(sid(0), EmbeddingKind::Text, vec![1.0, 0.0]);
        let hits = index.search(EmbeddingKind::Code, &[1.0, 0.0], 10);
        assert!(hits.is_empty());
    }
}
