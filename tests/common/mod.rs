//! Scripted fakes for the three collaborator ports.
//!
//! Every fake records its full call log so tests can assert call counts,
//! call order, and the security invariant that secrets never reach a
//! natural-language instruction.

// Each integration test binary compiles this module independently and
// uses a different subset of it.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use proofloop::domain::errors::{Error, Result};
use proofloop::domain::models::{Credentials, GrammarlyScores, HistoryEntry, Thresholds};
use proofloop::domain::ports::{
    ActTarget, BrowserDriver, BrowserSession, ObservedElement, PageHandle, RewriteOutcome,
    RewriteRequest, RewriteService, SecretsResolver, WaitPolicy,
};

pub const APP_URL: &str = "https://app.grammarly.com/";
pub const SIGNIN_URL: &str = "https://www.grammarly.com/signin";

/// Marker substring of the auth probe's observation query.
const AUTH_QUERY_MARKER: &str = "signed-in user";
/// Marker substring of the failure classifier's observation query.
const FAILURE_QUERY_MARKER: &str = "CAPTCHA challenges";
/// Marker substring of the login-submit fallback instruction.
const LOGIN_SUBMIT_MARKER: &str = "sign in";

#[derive(Default)]
pub struct FakePage {
    pub current_url: Mutex<String>,

    /// Popped per auth-indicator observation; `auth_default` applies when
    /// the queue is empty.
    pub auth_responses: Mutex<VecDeque<bool>>,
    pub auth_default: Mutex<bool>,

    /// Returned for every failure-classifier observation.
    pub failure_observations: Mutex<Vec<ObservedElement>>,

    /// Selectors `is_visible` answers true for.
    pub visible_selectors: Mutex<Vec<String>>,

    /// Popped per login-submit act; `Some(url)` simulates the redirect a
    /// successful submission causes.
    pub urls_after_login_submit: Mutex<VecDeque<Option<String>>>,

    /// Popped per extract call.
    pub extract_results: Mutex<VecDeque<std::result::Result<Value, String>>>,

    pub observe_log: Mutex<Vec<String>>,
    pub act_log: Mutex<Vec<ActTarget>>,
    pub fill_log: Mutex<Vec<(String, String)>>,
    pub navigate_log: Mutex<Vec<String>>,
}

impl FakePage {
    pub fn at(url: &str) -> Self {
        let page = Self::default();
        *page.current_url.lock().unwrap() = url.to_string();
        page
    }

    pub fn set_authenticated_by_default(&self, value: bool) {
        *self.auth_default.lock().unwrap() = value;
    }

    pub fn push_auth_response(&self, authenticated: bool) {
        self.auth_responses.lock().unwrap().push_back(authenticated);
    }

    pub fn push_extract_ok(&self, value: Value) {
        self.extract_results.lock().unwrap().push_back(Ok(value));
    }

    pub fn push_extract_err(&self, message: &str) {
        self.extract_results
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn mark_visible(&self, selector: &str) {
        self.visible_selectors
            .lock()
            .unwrap()
            .push(selector.to_string());
    }

    /// All natural-language strings this page ever received: observation
    /// queries plus fallback act instructions. The password must never
    /// appear in any of them.
    pub fn all_instructions(&self) -> Vec<String> {
        let mut instructions: Vec<String> = self.observe_log.lock().unwrap().clone();
        for target in self.act_log.lock().unwrap().iter() {
            if let Some(instruction) = target.instruction() {
                instructions.push(instruction.to_string());
            }
        }
        instructions
    }

    pub fn login_submit_count(&self) -> usize {
        self.act_log
            .lock()
            .unwrap()
            .iter()
            .filter(|target| match target {
                ActTarget::Fallback(instruction) => instruction.contains(LOGIN_SUBMIT_MARKER),
                ActTarget::Structured(element) => {
                    element.description.contains(LOGIN_SUBMIT_MARKER)
                }
            })
            .count()
    }
}

#[async_trait]
impl PageHandle for FakePage {
    async fn url(&self) -> Result<String> {
        Ok(self.current_url.lock().unwrap().clone())
    }

    async fn navigate(&self, url: &str, _wait: WaitPolicy) -> Result<()> {
        self.navigate_log.lock().unwrap().push(url.to_string());
        *self.current_url.lock().unwrap() = url.to_string();
        Ok(())
    }

    async fn observe(&self, query: &str) -> Result<Vec<ObservedElement>> {
        self.observe_log.lock().unwrap().push(query.to_string());

        if query.contains(AUTH_QUERY_MARKER) {
            let answered = self
                .auth_responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(*self.auth_default.lock().unwrap());
            return Ok(if answered {
                vec![ObservedElement::described("avatar button")]
            } else {
                vec![]
            });
        }

        if query.contains(FAILURE_QUERY_MARKER) {
            return Ok(self.failure_observations.lock().unwrap().clone());
        }

        // Every other query (email entry, submits, editor actions) comes
        // back empty so the flow exercises the fallback branch.
        Ok(vec![])
    }

    async fn act(&self, target: ActTarget) -> Result<()> {
        let is_login_submit = match &target {
            ActTarget::Fallback(instruction) => instruction.contains(LOGIN_SUBMIT_MARKER),
            ActTarget::Structured(element) => element.description.contains(LOGIN_SUBMIT_MARKER),
        };
        self.act_log.lock().unwrap().push(target);

        if is_login_submit {
            if let Some(Some(url)) = self.urls_after_login_submit.lock().unwrap().pop_front() {
                *self.current_url.lock().unwrap() = url;
            }
        }
        Ok(())
    }

    async fn extract(&self, _instruction: &str, _schema: Value) -> Result<Value> {
        match self.extract_results.lock().unwrap().pop_front() {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(Error::Automation(message)),
            None => Ok(json!({
                "ai_detection_percent": null,
                "plagiarism_percent": null,
                "notes": "unscripted extraction"
            })),
        }
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        self.fill_log
            .lock()
            .unwrap()
            .push((selector.to_string(), value.to_string()));
        Ok(())
    }

    async fn is_visible(&self, selector: &str) -> Result<bool> {
        Ok(self
            .visible_selectors
            .lock()
            .unwrap()
            .iter()
            .any(|s| s == selector))
    }
}

pub struct FakeDriver {
    pub page: Arc<FakePage>,
    pub debug_url: Option<String>,
    pub no_pages: bool,
    pub fail_close: bool,
    pub created: Mutex<Vec<String>>,
    pub closed: Mutex<Vec<String>>,
    pub pages_calls: Mutex<u32>,
}

impl FakeDriver {
    pub fn with_page(page: Arc<FakePage>) -> Self {
        Self {
            page,
            debug_url: Some("https://dbg.example/session-1".to_string()),
            no_pages: false,
            fail_close: false,
            created: Mutex::new(vec![]),
            closed: Mutex::new(vec![]),
            pages_calls: Mutex::new(0),
        }
    }

    pub fn pages_call_count(&self) -> u32 {
        *self.pages_calls.lock().unwrap()
    }
}

#[async_trait]
impl BrowserDriver for FakeDriver {
    async fn create_session(&self, profile: &str) -> Result<BrowserSession> {
        self.created.lock().unwrap().push(profile.to_string());
        Ok(BrowserSession {
            id: "session-1".to_string(),
            debug_url: self.debug_url.clone(),
        })
    }

    async fn close_session(&self, session: &BrowserSession) -> Result<()> {
        self.closed.lock().unwrap().push(session.id.clone());
        if self.fail_close {
            return Err(Error::Automation("teardown exploded".into()));
        }
        Ok(())
    }

    async fn pages(&self, _session: &BrowserSession) -> Result<Vec<Arc<dyn PageHandle>>> {
        *self.pages_calls.lock().unwrap() += 1;
        if self.no_pages {
            return Ok(vec![]);
        }
        Ok(vec![self.page.clone()])
    }
}

pub struct FakeSecrets {
    pub credentials: Option<Credentials>,
    pub error: Option<String>,
    pub calls: Mutex<u32>,
}

impl FakeSecrets {
    pub fn returning(username: &str, password: &str) -> Self {
        Self {
            credentials: Some(Credentials::new(username, password)),
            error: None,
            calls: Mutex::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            credentials: None,
            error: Some(message.to_string()),
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl SecretsResolver for FakeSecrets {
    async fn resolve(&self) -> Result<Credentials> {
        *self.calls.lock().unwrap() += 1;
        if let Some(message) = &self.error {
            return Err(Error::Secrets(message.clone()));
        }
        Ok(self.credentials.clone().expect("fake has credentials"))
    }
}

#[derive(Default)]
pub struct FakeRewriter {
    /// Popped per rewrite call; repeats the text with a marker when empty.
    pub outcomes: Mutex<VecDeque<RewriteOutcome>>,
    pub rewrite_calls: Mutex<Vec<RewriteRequest>>,
    pub summarize_calls: Mutex<u32>,
    pub analyze_calls: Mutex<u32>,
}

impl FakeRewriter {
    pub fn with_outcomes(outcomes: Vec<RewriteOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            ..Self::default()
        }
    }

    pub fn rewrite_count(&self) -> usize {
        self.rewrite_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl RewriteService for FakeRewriter {
    async fn rewrite(&self, request: &RewriteRequest) -> Result<RewriteOutcome> {
        self.rewrite_calls.lock().unwrap().push(request.clone());
        Ok(self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| RewriteOutcome {
                rewritten_text: format!("rewritten: {}", request.text),
                reasoning: "scripted".to_string(),
            }))
    }

    async fn analyze(&self, _text: &str, _scores: &GrammarlyScores) -> Result<String> {
        *self.analyze_calls.lock().unwrap() += 1;
        Ok("analysis narrative".to_string())
    }

    async fn summarize(
        &self,
        history: &[HistoryEntry],
        _final_scores: &GrammarlyScores,
    ) -> Result<String> {
        *self.summarize_calls.lock().unwrap() += 1;
        Ok(format!("summary of {} entries", history.len()))
    }
}

/// Scores payload as the extraction returns it.
pub fn scores_json(ai: Option<f64>, plagiarism: Option<f64>) -> Value {
    json!({
        "ai_detection_percent": ai,
        "plagiarism_percent": plagiarism,
        "notes": "scripted"
    })
}

/// Thresholds helper for direct service-level tests.
pub fn thresholds(max_ai: f64, max_plagiarism: f64) -> Thresholds {
    Thresholds {
        max_ai_percent: max_ai,
        max_plagiarism_percent: max_plagiarism,
    }
}
