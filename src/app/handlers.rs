//! `TaskHandler` implementations for the four task types (spec §4.6), each
//! wiring the application's shared `Application` handle into the narrower
//! piece of work its task type names. Constructed once at startup and
//! registered on the dispatcher.

use std::io::IsTerminal;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::application::Application;
use crate::chunking::languages::TSLanguageParsing;
use crate::domain::entities::{Commit, EmbeddingKind, SnippetId, TaskType};
use crate::enrich::Enricher;
use crate::error::KoditResult;
use crate::git::{GitAdapter, GixGitAdapter};
use crate::progress::{DbProgressSubscriber, LogProgressSubscriber, ProgressSubscriber, StepTree, TtyProgressSubscriber};
use crate::queue::TaskHandler;
use crate::repositories::{
    CommitRepository, EmbeddingRepository, EnrichmentRepository, FileRepository, RepositoryRepository,
    SnippetRepository, TaskStatusRepository,
};
use crate::search::vector::OpenAiEmbeddingProvider;
use crate::search::EmbeddingProvider;

use super::indexing::IndexingApplication;

/// Wires all three progress subscribers spec §4.7 names: the structured
/// logger always, the database persister so status summaries can be read
/// back later, and the tty renderer only when stdout is an actual terminal
/// (running under a test harness or as a daemon shouldn't spin up bars).
fn default_progress(app: &Application) -> StepTree {
    let mut subscribers: Vec<Arc<dyn ProgressSubscriber>> = vec![
        Arc::new(LogProgressSubscriber::default()),
        Arc::new(DbProgressSubscriber::new(TaskStatusRepository::new(app.db.clone()))),
    ];
    if std::io::stdout().is_terminal() {
        subscribers.push(Arc::new(TtyProgressSubscriber::default()));
    }
    StepTree::new(subscribers)
}

fn indexing_application(app: &Application, languages: Arc<TSLanguageParsing>) -> KoditResult<IndexingApplication> {
    Ok(IndexingApplication::new(
        Arc::new(GixGitAdapter::new()) as Arc<dyn GitAdapter>,
        app.config.clones_dir(),
        languages,
        RepositoryRepository::new(app.db.clone()),
        CommitRepository::new(app.db.clone()),
        FileRepository::new(app.db.clone()),
        SnippetRepository::new(app.db.clone()),
        Arc::clone(&app.dispatcher),
        default_progress(app),
        Arc::clone(&app.bm25),
    ))
}

#[derive(Deserialize)]
struct RepositoryIndexPayload {
    uri: String,
}

pub struct RepositoryIndexHandler {
    languages: Arc<TSLanguageParsing>,
}

impl RepositoryIndexHandler {
    pub fn new() -> Self {
        Self {
            languages: Arc::new(TSLanguageParsing::init()),
        }
    }
}

impl Default for RepositoryIndexHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskHandler for RepositoryIndexHandler {
    async fn handle(&self, app: &Application, payload: &serde_json::Value) -> KoditResult<()> {
        let payload: RepositoryIndexPayload = serde_json::from_value(payload.clone())?;
        indexing_application(app, Arc::clone(&self.languages))?
            .index_repository(&payload.uri)
            .await?;
        Ok(())
    }
}

pub struct CommitExtractHandler {
    languages: Arc<TSLanguageParsing>,
}

impl CommitExtractHandler {
    pub fn new() -> Self {
        Self {
            languages: Arc::new(TSLanguageParsing::init()),
        }
    }
}

impl Default for CommitExtractHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskHandler for CommitExtractHandler {
    async fn handle(&self, app: &Application, payload: &serde_json::Value) -> KoditResult<()> {
        let commit: Commit = serde_json::from_value(payload.clone())?;
        indexing_application(app, Arc::clone(&self.languages))?
            .extract_commit(commit)
            .await
    }
}

#[derive(Deserialize)]
struct SnippetBatchPayload {
    snippet_ids: Vec<String>,
}

pub struct SnippetEmbedHandler;

impl SnippetEmbedHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SnippetEmbedHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskHandler for SnippetEmbedHandler {
    /// Embeds every snippet in the batch under its `code` vector (spec
    /// §4.4, §4.6): identical content across commits shares one embedding
    /// row (spec §3 invariant 1), so already-embedded ids are skipped.
    async fn handle(&self, app: &Application, payload: &serde_json::Value) -> KoditResult<()> {
        let payload: SnippetBatchPayload = serde_json::from_value(payload.clone())?;
        let snippets = SnippetRepository::new(app.db.clone())
            .get_by_ids(&parse_snippet_ids(&payload.snippet_ids))
            .await?;
        if snippets.is_empty() {
            return Ok(());
        }

        let embeddings = EmbeddingRepository::new(app.db.clone());
        let mut pending = Vec::new();
        for snippet in &snippets {
            if !embeddings.exists(snippet.id, EmbeddingKind::Code).await? {
                pending.push((snippet.id, snippet.text.clone()));
            }
        }
        if pending.is_empty() {
            return Ok(());
        }

        let provider = OpenAiEmbeddingProvider::new(&app.config.embedding_endpoint(), 1536)?;
        let results = provider.embed_batch(pending).await?;
        for (id, vector) in results {
            embeddings.create_embedding(id, EmbeddingKind::Code, &vector).await?;
        }
        Ok(())
    }
}

pub struct SnippetEnrichHandler {
    system_prompt: String,
}

impl SnippetEnrichHandler {
    pub fn new() -> Self {
        Self {
            system_prompt: "Summarise what this code snippet does in one or two sentences.".to_owned(),
        }
    }
}

impl Default for SnippetEnrichHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskHandler for SnippetEnrichHandler {
    /// Summarises and text-embeds each snippet (spec §4.5, §4.4): the
    /// summary is stored, thinking tags already stripped, and a `text`
    /// embedding is produced from it so retrieval can fuse against
    /// enrichment text as well as code (spec §4.9).
    async fn handle(&self, app: &Application, payload: &serde_json::Value) -> KoditResult<()> {
        let payload: SnippetBatchPayload = serde_json::from_value(payload.clone())?;
        let snippets = SnippetRepository::new(app.db.clone())
            .get_by_ids(&parse_snippet_ids(&payload.snippet_ids))
            .await?;
        if snippets.is_empty() {
            return Ok(());
        }

        let enricher = Enricher::new(&app.config.enrichment_endpoint());
        let inputs: Vec<(usize, String)> = snippets.iter().enumerate().map(|(i, s)| (i, s.text.clone())).collect();
        let cancellation = tokio_util::sync::CancellationToken::new();
        let summaries = enricher.enrich_batch(&self.system_prompt, inputs, cancellation).await;

        let snippet_repo = SnippetRepository::new(app.db.clone());
        let enrichment_repo = EnrichmentRepository::new(app.db.clone());
        let embedding_repo = EmbeddingRepository::new(app.db.clone());
        let provider = OpenAiEmbeddingProvider::new(&app.config.embedding_endpoint(), 1536)?;

        let mut to_embed = Vec::new();
        for (idx, summary) in summaries {
            if summary.is_empty() {
                continue;
            }
            let snippet = &snippets[idx];
            snippet_repo.set_enrichment_summary(snippet.id, &summary).await?;
            enrichment_repo.upsert(snippet.id, &summary).await?;
            to_embed.push((snippet.id, summary));
        }

        if !to_embed.is_empty() {
            let results = provider.embed_batch(to_embed).await?;
            for (id, vector) in results {
                embedding_repo.create_embedding(id, EmbeddingKind::Text, &vector).await?;
            }
        }
        Ok(())
    }
}

fn parse_snippet_ids(hex_ids: &[String]) -> Vec<SnippetId> {
    hex_ids
        .iter()
        .filter_map(|hex| {
            let mut bytes = [0u8; 32];
            for (i, chunk) in hex.as_bytes().chunks(2).enumerate().take(32) {
                let s = std::str::from_utf8(chunk).ok()?;
                bytes[i] = u8::from_str_radix(s, 16).ok()?;
            }
            Some(SnippetId(bytes))
        })
        .collect()
}

/// Surfaced to callers that need a fresh registered dispatcher without
/// going through `main`, e.g. integration tests constructing an
/// `Application` directly.
pub async fn register_default_handlers(app: &Application) -> KoditResult<()> {
    app.dispatcher
        .register_handler(TaskType::RepositoryIndex, Arc::new(RepositoryIndexHandler::new()))
        .await;
    app.dispatcher
        .register_handler(TaskType::CommitExtract, Arc::new(CommitExtractHandler::new()))
        .await;
    app.dispatcher
        .register_handler(TaskType::SnippetEmbed, Arc::new(SnippetEmbedHandler::new()))
        .await;
    app.dispatcher
        .register_handler(TaskType::SnippetEnrich, Arc::new(SnippetEnrichHandler::new()))
        .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_snippet_ids_through_hex() {
        let id = SnippetId::of("fn main() {}", "src/main.rs", "rust");
        let parsed = parse_snippet_ids(&[id.to_hex()]);
        assert_eq!(parsed, vec![id]);
    }
}
