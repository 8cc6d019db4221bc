//! Optional LLM-backed summarisation (spec §4.5). Grounded on the
//! original's `infrastructure/enricher/litellm_enricher.py` (bounded
//! `Semaphore` concurrency, cancel-on-drop cleanup of outstanding futures)
//! and `.../enricher/utils.py`'s `clean_thinking_tags`.

use std::sync::Arc;

use async_openai::{
    config::OpenAIConfig,
    types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client,
};
use futures::stream::{FuturesUnordered, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::sync::Semaphore;

use crate::application::config::configuration::EndpointConfig;

const DEFAULT_CONCURRENCY: usize = 20;

/// Strips `<think>...</think>`-style spans before storage (spec §4.5), a
/// paired tag stripped non-greedily so multiple spans in one response are
/// each removed independently.
static THINK_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("static regex is valid"));

pub fn clean_thinking_tags(text: &str) -> String {
    THINK_TAG_RE.replace_all(text, "").trim().to_owned()
}

pub struct Enricher {
    client: Client<OpenAIConfig>,
    model: String,
    semaphore: Arc<Semaphore>,
}

impl Enricher {
    pub fn new(config: &EndpointConfig) -> Self {
        let mut openai_config = OpenAIConfig::new();
        if let Some(base_url) = &config.base_url {
            openai_config = openai_config.with_api_base(base_url.clone());
        }
        if let Some(api_key) = &config.api_key {
            openai_config = openai_config.with_api_key(api_key.clone());
        }
        let model = config.model.clone().unwrap_or_else(|| "gpt-4o-mini".to_owned());
        let concurrency = config.num_parallel_tasks.unwrap_or(DEFAULT_CONCURRENCY);

        Self {
            client: Client::with_config(openai_config),
            model,
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Summarises each `(id, text)` pair under the system prompt with
    /// bounded parallelism. Partial failures are logged and yield an empty
    /// summary rather than failing the enclosing task (spec §4.5). Honours
    /// `cancellation`: when it is notified, outstanding calls are left to
    /// resolve to their cancellation branch and no further calls are
    /// issued.
    pub async fn enrich_batch(
        &self,
        system_prompt: &str,
        inputs: Vec<(usize, String)>,
        cancellation: tokio_util::sync::CancellationToken,
    ) -> Vec<(usize, String)> {
        let mut futures = FuturesUnordered::new();

        for (id, text) in inputs {
            let client = self.client.clone();
            let model = self.model.clone();
            let system_prompt = system_prompt.to_owned();
            let semaphore = Arc::clone(&self.semaphore);
            let cancellation = cancellation.clone();

            futures.push(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (id, String::new()),
                };

                tokio::select! {
                    _ = cancellation.cancelled() => (id, String::new()),
                    result = call_once(&client, &model, &system_prompt, &text) => {
                        match result {
                            Ok(summary) => (id, clean_thinking_tags(&summary)),
                            Err(err) => {
                                tracing::warn!(error = %err, "enrichment call failed, yielding empty summary");
                                (id, String::new())
                            }
                        }
                    }
                }
            });
        }

        let mut results = Vec::with_capacity(futures.len());
        while let Some(result) = futures.next().await {
            results.push(result);
        }
        results
    }
}

async fn call_once(
    client: &Client<OpenAIConfig>,
    model: &str,
    system_prompt: &str,
    text: &str,
) -> anyhow::Result<String> {
    let request = CreateChatCompletionRequestArgs::default()
        .model(model)
        .messages(vec![
            ChatCompletionRequestUserMessageArgs::default()
                .content(format!("{system_prompt}\n\n{text}"))
                .build()?
                .into(),
        ])
        .build()?;

    let response = client.chat().create(request).await?;
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default();
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_single_think_span() {
        let input = "before <think>reasoning here</think> after";
        assert_eq!(clean_thinking_tags(input), "before  after".trim());
    }

    #[test]
    fn strips_multiple_spans_non_greedily() {
        let input = "<think>a</think>keep<think>b</think>";
        assert_eq!(clean_thinking_tags(input), "keep");
    }

    #[test]
    fn leaves_text_without_tags_untouched() {
        assert_eq!(clean_thinking_tags("just text"), "just text");
    }
}
