//! Port trait for the browser-automation driver.
//!
//! This is a **port** in hexagonal architecture terminology: the services
//! layer depends on these traits, not on the concrete HTTP automation
//! adapter. Tests substitute scripted fakes that record every call, which
//! is how the "password never reaches a natural-language instruction"
//! invariant is verified.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::domain::errors::Result;

/// Handle to one live automation session.
///
/// `debug_url` points at the provider's live session viewer so an operator
/// can take over when automation hits a wall (CAPTCHA, verification email).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserSession {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_url: Option<String>,
}

/// One element identified by an automation observe call.
///
/// The agent returns a human-readable description plus, when it can,
/// enough structure (selector, method, arguments) to replay the action
/// without another LLM round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedElement {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,
}

impl ObservedElement {
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            selector: None,
            method: None,
            arguments: vec![],
        }
    }
}

/// The two branches of every observe-then-act decision point.
///
/// `Structured` replays a concrete observed element; `Fallback` hands the
/// agent a natural-language instruction when observation came back empty.
/// Modeled as a tagged union (not a nullable check) so both branches are
/// deterministically exercisable through a scripted fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActTarget {
    Structured(ObservedElement),
    Fallback(String),
}

impl ActTarget {
    /// Structured target for the first observed element, else the given
    /// fallback instruction.
    pub fn first_or_fallback(
        observed: Vec<ObservedElement>,
        fallback: impl Into<String>,
    ) -> Self {
        observed
            .into_iter()
            .next()
            .map_or_else(|| Self::Fallback(fallback.into()), Self::Structured)
    }

    /// The natural-language instruction this target would send to the
    /// agent, if any. Structured targets replay without one.
    pub fn instruction(&self) -> Option<&str> {
        match self {
            Self::Structured(_) => None,
            Self::Fallback(instruction) => Some(instruction),
        }
    }
}

/// How long navigation waits before resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPolicy {
    /// Resolve once the document load event fires.
    Load,
    /// Wait for the network to go quiet. Timeouts under this policy map to
    /// [`crate::domain::errors::Error::NavigationTimeout`], which callers
    /// may tolerate: the page is usually already interactive.
    NetworkIdle,
}

/// Driver for session lifecycle. One session per optimizer invocation.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn create_session(&self, profile: &str) -> Result<BrowserSession>;

    /// Best-effort teardown. Callers log failures and never propagate them.
    async fn close_session(&self, session: &BrowserSession) -> Result<()>;

    /// Open pages in the session's browser context, in tab order.
    async fn pages(&self, session: &BrowserSession) -> Result<Vec<Arc<dyn PageHandle>>>;
}

/// One open page inside a session. All operations are sequential per
/// session; no two components hold the handle concurrently.
#[async_trait]
pub trait PageHandle: Send + Sync {
    async fn url(&self) -> Result<String>;

    async fn navigate(&self, url: &str, wait: WaitPolicy) -> Result<()>;

    /// Ask the agent to identify elements matching a natural-language
    /// query without acting on them. An empty result is a valid answer.
    async fn observe(&self, query: &str) -> Result<Vec<ObservedElement>>;

    /// Perform one interaction, either replaying an observed element or
    /// interpreting a natural-language instruction.
    async fn act(&self, target: ActTarget) -> Result<()>;

    /// Structured extraction against the current page.
    async fn extract(&self, instruction: &str, schema: Value) -> Result<Value>;

    /// Direct selector-based fill. This path never goes through the agent's
    /// language model, which is why credentials and user text must use it.
    async fn fill(&self, selector: &str, value: &str) -> Result<()>;

    async fn is_visible(&self, selector: &str) -> Result<bool>;
}
