//! Port trait for the rewrite/analysis LLM collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::Result;
use crate::domain::models::{GrammarlyScores, HistoryEntry, Thresholds, Tone};

/// One rewrite invocation: the current text plus everything the model
/// needs to aim the next draft at the configured thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteRequest {
    pub text: String,

    /// Scores from the most recent scoring pass, when extraction produced
    /// any. The model uses them to decide how aggressively to rephrase.
    pub last_scores: Option<GrammarlyScores>,

    pub targets: Thresholds,

    pub tone: Tone,

    /// Subject-matter hint threaded into the prompt verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_hint: Option<String>,

    /// Caller-supplied extra guidance, appended after the built-in prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_instructions: Option<String>,

    /// 1-based index of the loop iteration this rewrite feeds. Together
    /// with text length it selects the model tier.
    pub iteration: u32,
}

/// A rewritten draft plus the model's explanation of what it changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteOutcome {
    pub rewritten_text: String,
    pub reasoning: String,
}

/// The external rewrite/analyze/summarize service.
#[async_trait]
pub trait RewriteService: Send + Sync {
    /// Produce the next draft of the text.
    async fn rewrite(&self, request: &RewriteRequest) -> Result<RewriteOutcome>;

    /// One-shot narrative about a single set of baseline scores, for
    /// `analyze` mode. No rewriting happens.
    async fn analyze(&self, text: &str, scores: &GrammarlyScores) -> Result<String>;

    /// Narrative over a full run's history, appended to the result notes
    /// after the loop finishes.
    async fn summarize(
        &self,
        history: &[HistoryEntry],
        final_scores: &GrammarlyScores,
    ) -> Result<String>;
}
