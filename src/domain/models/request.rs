//! Tool-boundary request types shared by the CLI and the MCP server.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::scores::Thresholds;

/// What the caller wants from a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Iteratively rewrite until thresholds are met or the budget runs out.
    #[default]
    Optimize,
    /// Single scoring pass on the unmodified text, no rewriting.
    ScoreOnly,
    /// Single scoring pass plus a narrative analysis of the baseline; no
    /// rewriting, zero iterations consumed.
    Analyze,
}

/// Tone guidance threaded into rewrite prompts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    #[default]
    Neutral,
    Formal,
    Informal,
    Academic,
    /// Free-form tone description supplied by the caller.
    Custom(String),
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Neutral => write!(f, "neutral"),
            Self::Formal => write!(f, "formal"),
            Self::Informal => write!(f, "informal"),
            Self::Academic => write!(f, "academic"),
            Self::Custom(description) => write!(f, "{description}"),
        }
    }
}

/// A single optimization request as it arrives over the tool boundary.
///
/// Absent fields take the documented defaults so that the JSON wire shape
/// and the programmatic constructor agree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OptimizeRequest {
    pub text: String,

    #[serde(default)]
    pub mode: Mode,

    #[serde(default)]
    pub tone: Tone,

    /// Subject-matter hint for the rewrite prompt ("medical research
    /// abstract", "marketing copy").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_hint: Option<String>,

    /// Extra rewrite guidance, appended verbatim after the built-in prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_instructions: Option<String>,

    #[serde(default = "default_max_ai_percent")]
    pub max_ai_percent: f64,

    #[serde(default = "default_max_plagiarism_percent")]
    pub max_plagiarism_percent: f64,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

const fn default_max_ai_percent() -> f64 {
    10.0
}

const fn default_max_plagiarism_percent() -> f64 {
    5.0
}

const fn default_max_iterations() -> u32 {
    5
}

/// Most iterations one invocation may consume, regardless of request.
pub const MAX_ITERATIONS_CAP: u32 = 20;

impl OptimizeRequest {
    /// Request with default mode, tone, thresholds, and iteration budget.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode: Mode::default(),
            tone: Tone::default(),
            domain_hint: None,
            custom_instructions: None,
            max_ai_percent: default_max_ai_percent(),
            max_plagiarism_percent: default_max_plagiarism_percent(),
            max_iterations: default_max_iterations(),
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            max_ai_percent: self.max_ai_percent,
            max_plagiarism_percent: self.max_plagiarism_percent,
        }
    }

    /// Boundary validation. Rejects malformed requests before any browser
    /// session is created.
    pub fn validate(&self) -> Result<(), String> {
        if self.text.trim().is_empty() {
            return Err("text must not be empty".to_string());
        }
        if self.max_iterations == 0 || self.max_iterations > MAX_ITERATIONS_CAP {
            return Err(format!(
                "max_iterations must be between 1 and {MAX_ITERATIONS_CAP}"
            ));
        }
        if !(0.0..=100.0).contains(&self.max_ai_percent) {
            return Err("max_ai_percent must be between 0 and 100".to_string());
        }
        if !(0.0..=100.0).contains(&self.max_plagiarism_percent) {
            return Err("max_plagiarism_percent must be between 0 and 100".to_string());
        }
        Ok(())
    }
}
