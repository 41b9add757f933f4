//! Anthropic Messages API adapter for the rewrite service.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::retry::{ApiError, RetryPolicy};
use crate::domain::errors::{Error, Result};
use crate::domain::models::{GrammarlyScores, HistoryEntry, RewriterConfig};
use crate::domain::ports::{RewriteOutcome, RewriteRequest, RewriteService};
use crate::services::{choose_model_tier, ModelTier};

const ANTHROPIC_VERSION: &str = "2023-06-01";

const REWRITE_SYSTEM_PROMPT: &str = "You rewrite text to read as natural human prose while \
     preserving its meaning, facts, and structure. Vary sentence length and rhythm, prefer \
     concrete phrasing, and avoid boilerplate transitions. Respond with a JSON object with \
     exactly two string fields: rewritten_text and reasoning.";

#[derive(Debug, Serialize)]
struct MessageRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RewritePayload {
    rewritten_text: String,
    #[serde(default)]
    reasoning: String,
}

/// Messages API client implementing [`RewriteService`].
pub struct AnthropicRewriter {
    http: ReqwestClient,
    base_url: String,
    api_key: String,
    standard_model: String,
    advanced_model: String,
    max_tokens: usize,
    retry: RetryPolicy,
}

impl AnthropicRewriter {
    pub fn new(config: &RewriterConfig) -> anyhow::Result<Self> {
        Self::with_retry_policy(config, RetryPolicy::default())
    }

    pub fn with_retry_policy(
        config: &RewriterConfig,
        retry: RetryPolicy,
    ) -> anyhow::Result<Self> {
        let http = ReqwestClient::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .context("Failed to build rewriter HTTP client")?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            standard_model: config.standard_model.clone(),
            advanced_model: config.advanced_model.clone(),
            max_tokens: config.max_tokens,
            retry,
        })
    }

    fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Standard => &self.standard_model,
            ModelTier::Advanced => &self.advanced_model,
        }
    }

    async fn send_once(
        &self,
        model: &str,
        system: &str,
        user: &str,
    ) -> std::result::Result<String, ApiError> {
        let request = MessageRequest {
            model,
            max_tokens: self.max_tokens,
            system,
            messages: vec![Message {
                role: "user",
                content: user,
            }],
        };

        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|err| ApiError::Transient(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("{status}: {body}");
            // 429 and server-side failures are transient; everything else
            // (auth, malformed request) will not improve on retry.
            return if status.as_u16() == 429 || status.is_server_error() {
                Err(ApiError::Transient(message))
            } else {
                Err(ApiError::Permanent(message))
            };
        }

        let parsed: MessageResponse = response
            .json()
            .await
            .map_err(|err| ApiError::Permanent(format!("malformed response: {err}")))?;

        parsed
            .content
            .into_iter()
            .find(|block| block.content_type == "text")
            .and_then(|block| block.text)
            .ok_or_else(|| ApiError::Permanent("response contained no text block".to_string()))
    }

    async fn send(&self, model: &str, system: &str, user: &str) -> Result<String> {
        self.retry
            .execute(|| self.send_once(model, system, user))
            .await
            .map_err(|err| Error::Rewrite(err.to_string()))
    }
}

#[async_trait]
impl RewriteService for AnthropicRewriter {
    async fn rewrite(&self, request: &RewriteRequest) -> Result<RewriteOutcome> {
        let tier = choose_model_tier(request.text.chars().count(), request.iteration);
        let model = self.model_for(tier);
        debug!(?tier, model, iteration = request.iteration, "dispatching rewrite");

        let user = build_rewrite_prompt(request);
        let raw = self.send(model, REWRITE_SYSTEM_PROMPT, &user).await?;
        Ok(parse_rewrite_payload(&raw))
    }

    async fn analyze(&self, text: &str, scores: &GrammarlyScores) -> Result<String> {
        let user = format!(
            "Current detection results:\n{}\n\nText (excerpt):\n{}\n\n\
             Explain in a short paragraph what most likely drives these scores \
             and what kinds of edits would lower them.",
            render_scores(scores),
            excerpt(text, 2_000),
        );
        self.send(
            &self.standard_model,
            "You analyze AI-detection and plagiarism results for a writing tool.",
            &user,
        )
        .await
    }

    async fn summarize(
        &self,
        history: &[HistoryEntry],
        final_scores: &GrammarlyScores,
    ) -> Result<String> {
        let mut lines = String::new();
        for entry in history {
            lines.push_str(&format!(
                "iteration {}: ai={} plagiarism={} ({})\n",
                entry.iteration,
                entry
                    .ai_detection_percent
                    .map_or_else(|| "n/a".to_string(), |v| format!("{v}%")),
                entry
                    .plagiarism_percent
                    .map_or_else(|| "n/a".to_string(), |v| format!("{v}%")),
                entry.note,
            ));
        }
        let user = format!(
            "Run history:\n{lines}\nFinal:\n{}\n\n\
             Summarize this optimization run in two or three sentences.",
            render_scores(final_scores),
        );
        self.send(
            &self.standard_model,
            "You summarize score-optimization runs for a writing tool.",
            &user,
        )
        .await
    }
}

fn build_rewrite_prompt(request: &RewriteRequest) -> String {
    let mut prompt = format!("Rewrite the following text in a {} tone.\n", request.tone);
    if let Some(hint) = &request.domain_hint {
        prompt.push_str(&format!("The text is from this domain: {hint}.\n"));
    }
    prompt.push_str(&format!(
        "Targets: AI detection at most {}%, plagiarism at most {}%.\n",
        request.targets.max_ai_percent, request.targets.max_plagiarism_percent
    ));
    if let Some(scores) = &request.last_scores {
        prompt.push_str(&format!("Most recent scores:\n{}\n", render_scores(scores)));
    }
    if let Some(instructions) = &request.custom_instructions {
        prompt.push_str(&format!("Additional instructions: {instructions}\n"));
    }
    prompt.push_str(&format!("\nText:\n{}", request.text));
    prompt
}

/// Parse the model's JSON payload, tolerating markdown code fences. A
/// response that is not valid JSON is treated as the rewritten text
/// itself rather than failing the iteration.
fn parse_rewrite_payload(raw: &str) -> RewriteOutcome {
    let trimmed = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    match serde_json::from_str::<RewritePayload>(trimmed) {
        Ok(payload) => RewriteOutcome {
            rewritten_text: payload.rewritten_text,
            reasoning: payload.reasoning,
        },
        Err(_) => RewriteOutcome {
            rewritten_text: trimmed.to_string(),
            reasoning: String::new(),
        },
    }
}

fn render_scores(scores: &GrammarlyScores) -> String {
    format!(
        "ai_detection: {}\nplagiarism: {}\nnotes: {}",
        scores
            .ai_detection_percent
            .map_or_else(|| "unavailable".to_string(), |v| format!("{v}%")),
        scores
            .plagiarism_percent
            .map_or_else(|| "unavailable".to_string(), |v| format!("{v}%")),
        scores.notes,
    )
}

fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
