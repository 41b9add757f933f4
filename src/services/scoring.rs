//! Drives the editor through one scoring pass: navigate, inject text,
//! open the detection panel, extract structured scores.
//!
//! Security invariant: the user's text is injected through the direct
//! content-editable fill path regardless of length. Routing it through a
//! natural-language instruction would let arbitrary input steer the
//! automation agent (prompt injection) and expose it to a model context
//! for no reason.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::errors::{Error, Result};
use crate::domain::models::{
    AppConfig, Credentials, GrammarlyScores, LoginConfig, LoginFailure,
};
use crate::domain::ports::{
    ActTarget, BrowserDriver, BrowserSession, PageHandle, SecretsResolver, WaitPolicy,
};
use crate::services::auth_probe::AuthStatusProbe;
use crate::services::login::LoginStateMachine;
use crate::services::timeout::with_timeout;

/// Hard cap on injected text, matching the editor's practical limits.
pub const MAX_EDITOR_TEXT_LEN: usize = 8_000;

/// Direct fill target for the document body.
const EDITOR_SELECTOR: &str = r#"[contenteditable="true"]"#;

/// Ceiling on one structured extraction round-trip; the agent's model
/// call can otherwise hang well past the page being ready.
const EXTRACT_TIMEOUT_MS: u64 = 60_000;

const NEW_DOC_QUERY: &str = "button to create a new document";
const NEW_DOC_FALLBACK: &str = "click the New document button";
const PANEL_QUERY: &str = "button or tab opening the AI detection and plagiarism panel";
const PANEL_FALLBACK: &str = "open the AI detection panel";

const EXTRACT_INSTRUCTION: &str = "Extract the AI detection percentage, plagiarism percentage, \
     overall writing score, and any notes shown in the detection panel. \
     Use null for any value the panel does not show.";
const EXTRACT_FALLBACK_INSTRUCTION: &str =
    "Extract any AI detection or plagiarism percentages visible on the page; null if absent.";

/// Per-call options threaded from the optimization loop.
#[derive(Debug, Clone, Default)]
pub struct ScoringOptions {
    /// Loop iteration this pass belongs to; 0 is the baseline.
    pub iteration: u32,
    /// Overrides the session's own debug URL on authentication errors.
    pub debug_url: Option<String>,
}

/// One scoring pass over a live session.
pub struct ScoringTaskRunner {
    driver: Arc<dyn BrowserDriver>,
    /// Absent means auto-login is not configured: an unauthenticated page
    /// fails fast instead of attempting credential resolution.
    secrets: Option<Arc<dyn SecretsResolver>>,
    app: AppConfig,
    login: LoginConfig,
}

impl ScoringTaskRunner {
    pub fn new(
        driver: Arc<dyn BrowserDriver>,
        secrets: Option<Arc<dyn SecretsResolver>>,
        app: AppConfig,
        login: LoginConfig,
    ) -> Self {
        Self {
            driver,
            secrets,
            app,
            login,
        }
    }

    /// Score one text in the given session.
    pub async fn score(
        &self,
        session: &BrowserSession,
        text: &str,
        options: &ScoringOptions,
    ) -> Result<GrammarlyScores> {
        let pages = self.driver.pages(session).await?;
        let page = pages.first().ok_or(Error::NoPage)?.clone();
        let page = page.as_ref();

        let debug_url = options
            .debug_url
            .clone()
            .or_else(|| session.debug_url.clone());

        info!(iteration = options.iteration, "starting scoring pass");

        let auth = AuthStatusProbe::check(page).await;
        if !auth.is_authenticated() {
            self.ensure_authenticated(page, debug_url).await?;
        }

        self.navigate_to_editor(page).await?;

        let truncated = truncate_for_editor(text);
        if truncated.len() < text.len() {
            warn!(
                original_chars = text.chars().count(),
                "input text truncated to editor limit"
            );
        }

        self.trigger(page, NEW_DOC_QUERY, NEW_DOC_FALLBACK).await?;

        // Direct fill only. See the module invariant.
        page.fill(EDITOR_SELECTOR, truncated).await?;
        self.settle().await;

        self.trigger(page, PANEL_QUERY, PANEL_FALLBACK).await?;

        self.extract_scores(page).await
    }

    /// Resolve credentials and run the login machine. Every failure on
    /// this path becomes [`Error::AuthenticationRequired`] carrying the
    /// session debug URL, the one error type callers pattern-match on.
    async fn ensure_authenticated(
        &self,
        page: &dyn PageHandle,
        debug_url: Option<String>,
    ) -> Result<()> {
        let Some(resolver) = &self.secrets else {
            return Err(Error::authentication(
                "Not signed in and no credential integration is configured; \
                 sign in manually through the debug session",
                debug_url,
            ));
        };

        let credentials = match resolver.resolve().await {
            Ok(credentials) => credentials,
            Err(err) => {
                let detail = match err {
                    Error::Secrets(message) => message,
                    other => other.to_string(),
                };
                return Err(Error::authentication(
                    format!("1Password error: {detail}"),
                    debug_url,
                ));
            }
        };

        self.attempt_login(page, &credentials, debug_url).await
    }

    async fn attempt_login(
        &self,
        page: &dyn PageHandle,
        credentials: &Credentials,
        debug_url: Option<String>,
    ) -> Result<()> {
        let machine = LoginStateMachine::new(page, self.login, self.app.login_url.clone());
        let result = machine.run(credentials).await;
        if result.success {
            // Login success is trusted; no re-verification pass.
            return Ok(());
        }

        let message = match result.failure {
            Some(LoginFailure::InvalidCredentials) => {
                "Auto-login failed: invalid credentials; update the stored credential pair"
                    .to_string()
            }
            Some(LoginFailure::CaptchaDetected) => {
                "Auto-login failed: CAPTCHA challenge; complete it manually through the debug session"
                    .to_string()
            }
            Some(LoginFailure::RateLimited) => {
                "Auto-login failed: rate limited; wait before trying again".to_string()
            }
            None => format!(
                "Auto-login failed: {}",
                result.error.as_deref().unwrap_or("unknown error")
            ),
        };
        Err(Error::authentication(message, debug_url))
    }

    /// Navigate to the editor unless the page is already inside the app
    /// domain. A network-idle timeout is tolerated: the page is usually
    /// interactive well before the network goes quiet.
    async fn navigate_to_editor(&self, page: &dyn PageHandle) -> Result<()> {
        let current = page.url().await.unwrap_or_default();
        if is_within_app(&current, &self.app.url) {
            debug!(url = %current, "already inside the app");
            return Ok(());
        }

        match page.navigate(&self.app.url, WaitPolicy::NetworkIdle).await {
            Ok(()) => {}
            Err(Error::NavigationTimeout { url }) => {
                warn!(%url, "network-idle wait timed out, continuing with the loaded page");
            }
            Err(other) => return Err(other),
        }
        self.settle().await;
        Ok(())
    }

    /// Observe-then-act with a string fallback: structural targeting when
    /// the observation yields an element, semantic instruction otherwise.
    async fn trigger(&self, page: &dyn PageHandle, query: &str, fallback: &str) -> Result<()> {
        let observed = page.observe(query).await.unwrap_or_default();
        page.act(ActTarget::first_or_fallback(observed, fallback))
            .await?;
        self.settle().await;
        Ok(())
    }

    /// Structured extraction with exactly one simplified fallback. When
    /// both fail the original error propagates; the fallback failure is
    /// only logged, so the primary diagnostic survives.
    async fn extract_scores(&self, page: &dyn PageHandle) -> Result<GrammarlyScores> {
        let schema = json!({
            "type": "object",
            "properties": {
                "ai_detection_percent": { "type": ["number", "null"] },
                "plagiarism_percent": { "type": ["number", "null"] },
                "overall_score": { "type": ["number", "null"] },
                "notes": { "type": "string" }
            },
            "required": ["ai_detection_percent", "plagiarism_percent"]
        });

        let primary_err = match with_timeout(
            "score extraction",
            EXTRACT_TIMEOUT_MS,
            page.extract(EXTRACT_INSTRUCTION, schema),
        )
        .await
        {
            Ok(value) => return parse_scores(value),
            Err(err) => err,
        };

        let simplified = json!({
            "type": "object",
            "properties": {
                "ai_detection_percent": { "type": ["number", "null"] },
                "plagiarism_percent": { "type": ["number", "null"] }
            }
        });
        match with_timeout(
            "fallback score extraction",
            EXTRACT_TIMEOUT_MS,
            page.extract(EXTRACT_FALLBACK_INSTRUCTION, simplified),
        )
        .await
        {
            Ok(value) => {
                let mut scores = parse_scores(value)?;
                if scores.notes.is_empty() {
                    scores.notes = "partial extraction via fallback".to_string();
                } else {
                    scores.notes.push_str(" (partial extraction via fallback)");
                }
                Ok(scores)
            }
            Err(fallback_err) => {
                debug!(error = %fallback_err, "fallback extraction also failed, suppressed");
                Err(primary_err)
            }
        }
    }

    async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(self.login.settle_delay_ms)).await;
    }
}

/// Whether `current` already sits on the app's host.
fn is_within_app(current: &str, app_url: &str) -> bool {
    let current_host = url::Url::parse(current).ok().and_then(|u| u.host_str().map(String::from));
    let app_host = url::Url::parse(app_url).ok().and_then(|u| u.host_str().map(String::from));
    match (current_host, app_host) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// First [`MAX_EDITOR_TEXT_LEN`] characters; shorter input passes through
/// untouched.
pub fn truncate_for_editor(text: &str) -> &str {
    match text.char_indices().nth(MAX_EDITOR_TEXT_LEN) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

fn parse_scores(value: serde_json::Value) -> Result<GrammarlyScores> {
    serde_json::from_value(value)
        .map_err(|err| Error::Extraction(format!("malformed extraction payload: {err}")))
}
