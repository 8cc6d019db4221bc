//! `POST /api/v1/search` (spec §6, §4.9): the HTTP front door to
//! `RetrievalApplication`.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::app::{RetrievalApplication, ScoredSnippet};
use crate::application::Application;
use crate::repositories::{EmbeddingRepository, EnrichmentRepository, RepositoryRepository, SnippetRepository};
use crate::search::vector::OpenAiEmbeddingProvider;

use super::types::{json, ApiResponse, WebResult};

#[derive(Deserialize)]
pub(crate) struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub repo_uri: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

#[derive(Serialize)]
pub(crate) struct SearchResponse(Vec<ScoredSnippet>);

impl ApiResponse for SearchResponse {}

pub(crate) async fn search(
    State(app): State<Application>,
    Json(request): Json<SearchRequest>,
) -> WebResult<impl IntoResponse> {
    let results = run_search(&app, &request.query, request.repo_uri.as_deref(), request.limit).await?;
    Ok(json(SearchResponse(results)))
}

/// Shared by the HTTP route and the MCP tool surface (spec §6): both read
/// from the same fused index, they only differ in response shape.
pub(crate) async fn run_search(
    app: &Application,
    query: &str,
    repo_uri: Option<&str>,
    limit: usize,
) -> WebResult<Vec<ScoredSnippet>> {
    let provider = OpenAiEmbeddingProvider::new(&app.config.embedding_endpoint(), 1536)?;
    let retrieval = RetrievalApplication::new(
        RepositoryRepository::new(app.db.clone()),
        SnippetRepository::new(app.db.clone()),
        EmbeddingRepository::new(app.db.clone()),
        EnrichmentRepository::new(app.db.clone()),
        Arc::clone(&app.bm25),
        Arc::new(provider),
    );
    Ok(retrieval.search(query, repo_uri, limit).await?)
}
