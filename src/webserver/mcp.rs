//! MCP tool surface (spec §6): a single SSE-served tool,
//! `retrieve_relevant_snippets(search_query, related_file_paths[],
//! related_file_contents[])`, returning fenced markdown code blocks.
//! SSE framing grounded on the teacher's `webserver/agent.rs` (`sse::Event`,
//! `Sse::new`, `futures::stream::once` for the envelope events).

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures::stream::{self, Stream};
use serde::Deserialize;
use serde_json::json;

use crate::application::Application;

use super::search::run_search;
use super::types::WebError;

#[derive(Deserialize)]
pub(crate) struct RetrieveRelevantSnippetsArgs {
    pub search_query: String,
    #[serde(default)]
    pub related_file_paths: Vec<String>,
    #[serde(default)]
    pub related_file_contents: Vec<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

/// Folds the related-file context into the query text so file-aware
/// retrieval doesn't need a second ranking pass (spec §6 names the tool's
/// input shape, not a fusion algorithm for it).
fn augmented_query(args: &RetrieveRelevantSnippetsArgs) -> String {
    let mut augmented = args.search_query.clone();
    for (path, content) in args.related_file_paths.iter().zip(&args.related_file_contents) {
        augmented.push_str(&format!("\n\n# {path}\n{content}"));
    }
    augmented
}

fn snippet_to_markdown(snippet: &crate::app::ScoredSnippet) -> String {
    format!("```{}\n# {}\n{}\n```", snippet.language, snippet.file_path, snippet.text)
}

pub(crate) async fn retrieve_relevant_snippets(
    State(app): State<Application>,
    Json(args): Json<RetrieveRelevantSnippetsArgs>,
) -> Result<impl IntoResponse, WebError> {
    let query = augmented_query(&args);
    let results = run_search(&app, &query, None, args.limit).await?;

    let blocks: Vec<String> = results.iter().map(snippet_to_markdown).collect();
    let events = stream::once(async move {
        Result::<Event, std::convert::Infallible>::Ok(
            Event::default()
                .json_data(json!({ "content": blocks.join("\n\n") }))
                .expect("tool result event serializes"),
        )
    });

    Ok(Sse::new(Box::pin(events) as std::pin::Pin<Box<dyn Stream<Item = Result<Event, std::convert::Infallible>> + Send>>))
}
