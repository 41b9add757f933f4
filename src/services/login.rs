//! Login state machine for the editor's sign-in flow.
//!
//! One attempt walks navigate → observe → fill → submit → verify. The
//! outer loop retries unclassified failures with exponential backoff;
//! classified failures (wrong password, CAPTCHA, rate limit) are terminal
//! because retrying cannot fix them and makes CAPTCHA and throttling
//! pages worse.
//!
//! Security invariant: the password is only ever written through the
//! direct selector fill path. No natural-language instruction sent to the
//! automation agent may contain it.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::models::{Credentials, LoginAttemptResult, LoginConfig, LoginFailure};
use crate::domain::ports::{ActTarget, PageHandle};
use crate::services::auth_probe::{is_login_family_url, AuthStatusProbe};
use crate::services::failure_classifier::{classify_login_failure, FailureVerdict};

/// Structural locators for the email/username field, tried in order.
/// The first visible match is filled directly; the agent only gets a
/// natural-language instruction when none of these are visible.
const EMAIL_SELECTORS: &[&str] = &[
    r#"input[type="email"]"#,
    r#"input[type="text"]"#,
    r#"input[name*="email"]"#,
    r#"input[name*="username"]"#,
];

/// The only path to the password field. Never replaced by an instruction.
const PASSWORD_SELECTOR: &str = r#"input[type="password"]"#;

const EMAIL_ENTRY_QUERY: &str = "button or link to log in with an email address";
const EMAIL_SUBMIT_QUERY: &str = "continue or next button submitting the email form";
const EMAIL_SUBMIT_FALLBACK: &str = "click the continue button";
const LOGIN_SUBMIT_QUERY: &str = "sign in or log in button submitting the login form";
const LOGIN_SUBMIT_FALLBACK: &str = "click the sign in button";

/// Where one attempt currently is. Used for tracing and error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginStep {
    NavigatingToLogin,
    LocatingEmailEntry,
    FillingEmail,
    SubmittingEmail,
    LocatingPassword,
    FillingPassword,
    SubmittingLogin,
    VerifyingAuth,
}

/// Outcome of a single attempt, before retry policy is applied.
enum AttemptOutcome {
    Success,
    /// A classified failure. No retry; the reason goes back to the caller.
    Terminal(LoginFailure, String),
    /// Unclassified failure or a thrown step error. Eligible for retry.
    Retryable(String),
}

/// Drives the sign-in flow on one page.
///
/// Entry condition: the caller has already probed the page and got a
/// not-authenticated verdict.
pub struct LoginStateMachine<'a> {
    page: &'a dyn PageHandle,
    config: LoginConfig,
    login_url: String,
}

impl<'a> LoginStateMachine<'a> {
    pub fn new(page: &'a dyn PageHandle, config: LoginConfig, login_url: impl Into<String>) -> Self {
        Self {
            page,
            config,
            login_url: login_url.into(),
        }
    }

    /// Run the full login flow, retries included.
    pub async fn run(&self, credentials: &Credentials) -> LoginAttemptResult {
        let total_attempts = self.config.max_retries + 1;
        for attempt in 0..total_attempts {
            if attempt > 0 {
                let delay = backoff_delay(
                    attempt - 1,
                    self.config.base_backoff_ms,
                    self.config.max_backoff_ms,
                );
                info!(attempt, delay_ms = delay.as_millis() as u64, "backing off before login retry");
                tokio::time::sleep(delay).await;
            }

            match self.attempt(credentials).await {
                AttemptOutcome::Success => {
                    info!(attempt, "login succeeded");
                    return LoginAttemptResult::succeeded();
                }
                AttemptOutcome::Terminal(failure, message) => {
                    warn!(attempt, %failure, "login failed with a terminal classification");
                    return LoginAttemptResult::failed(message, Some(failure));
                }
                AttemptOutcome::Retryable(message) => {
                    warn!(attempt, message, "login attempt failed, may retry");
                }
            }
        }

        LoginAttemptResult::failed("Login failed after all retry attempts", None)
    }

    /// One pass through the state sequence. Step errors become retryable
    /// outcomes; only the classifier can make a failure terminal.
    async fn attempt(&self, credentials: &Credentials) -> AttemptOutcome {
        match self.walk_states(credentials).await {
            Ok(outcome) => outcome,
            Err(err) => AttemptOutcome::Retryable(err.to_string()),
        }
    }

    async fn walk_states(
        &self,
        credentials: &Credentials,
    ) -> crate::domain::errors::Result<AttemptOutcome> {
        self.navigate_to_login().await?;
        self.maybe_enter_email_flow().await?;
        self.fill_email(&credentials.username).await?;
        self.submit(LoginStep::SubmittingEmail, EMAIL_SUBMIT_QUERY, EMAIL_SUBMIT_FALLBACK)
            .await?;
        self.fill_password(&credentials.password).await?;
        self.submit(LoginStep::SubmittingLogin, LOGIN_SUBMIT_QUERY, LOGIN_SUBMIT_FALLBACK)
            .await?;

        debug!(step = ?LoginStep::VerifyingAuth, "verifying authentication");
        let state = AuthStatusProbe::check(self.page).await;
        if state.is_authenticated() {
            return Ok(AttemptOutcome::Success);
        }

        Ok(match classify_login_failure(self.page).await {
            Some(FailureVerdict::Classified(failure, message)) => {
                AttemptOutcome::Terminal(failure, message)
            }
            Some(FailureVerdict::Generic(message)) => AttemptOutcome::Retryable(message),
            None => AttemptOutcome::Retryable(
                "login did not reach an authenticated state".to_string(),
            ),
        })
    }

    /// Skipped when the page is already in the sign-in flow (a prior
    /// attempt or a redirect may have landed there).
    async fn navigate_to_login(&self) -> crate::domain::errors::Result<()> {
        debug!(step = ?LoginStep::NavigatingToLogin, "checking current page");
        let current = self.page.url().await?;
        if !is_login_family_url(&current) {
            self.page
                .navigate(&self.login_url, crate::domain::ports::WaitPolicy::Load)
                .await?;
            self.settle().await;
        }
        Ok(())
    }

    /// Optional pre-step: some variants of the page hide the email form
    /// behind a "log in with email" button. An empty observation means the
    /// form is already showing, which is not an error.
    async fn maybe_enter_email_flow(&self) -> crate::domain::errors::Result<()> {
        debug!(step = ?LoginStep::LocatingEmailEntry, "looking for an email-login entry point");
        match self.page.observe(EMAIL_ENTRY_QUERY).await {
            Ok(observed) => {
                if let Some(element) = observed.into_iter().next() {
                    self.page.act(ActTarget::Structured(element)).await?;
                    self.settle().await;
                }
            }
            Err(err) => {
                debug!(error = %err, "email entry observation failed, skipping optional step");
            }
        }
        Ok(())
    }

    /// Fill the email field through the first visible structural locator.
    /// The direct fill path bypasses the agent's language model; the
    /// natural-language fallback is a last resort and carries only the
    /// username, never the password.
    async fn fill_email(&self, username: &str) -> crate::domain::errors::Result<()> {
        debug!(step = ?LoginStep::FillingEmail, "filling email field");
        for selector in EMAIL_SELECTORS {
            let visible = self.page.is_visible(selector).await.unwrap_or(false);
            if visible {
                self.page.fill(selector, username).await?;
                self.settle().await;
                return Ok(());
            }
        }

        warn!("no structural email locator visible, falling back to an instruction");
        self.page
            .act(ActTarget::Fallback(format!(
                "type \"{username}\" into the email or username field"
            )))
            .await?;
        self.settle().await;
        Ok(())
    }

    /// Fill the password through the structural selector only. There is
    /// deliberately no instruction fallback on this path: an instruction
    /// would put the secret into the agent's model context.
    async fn fill_password(&self, password: &str) -> crate::domain::errors::Result<()> {
        debug!(step = ?LoginStep::LocatingPassword, "waiting for the password field");
        let visible = self.page.is_visible(PASSWORD_SELECTOR).await.unwrap_or(false);
        if !visible {
            // The field may still be rendering after the email submit.
            // Give it one settle period, then fill unconditionally; the
            // fill itself surfaces the error when the field never appears.
            self.settle().await;
        }

        debug!(step = ?LoginStep::FillingPassword, "filling password field");
        self.page.fill(PASSWORD_SELECTOR, password).await?;
        self.settle().await;
        Ok(())
    }

    async fn submit(
        &self,
        step: LoginStep,
        query: &str,
        fallback: &str,
    ) -> crate::domain::errors::Result<()> {
        debug!(?step, "submitting");
        let observed = self.page.observe(query).await.unwrap_or_default();
        self.page
            .act(ActTarget::first_or_fallback(observed, fallback))
            .await?;
        self.settle().await;
        Ok(())
    }

    /// Fixed pause after UI-mutating steps so asynchronous page updates
    /// settle before the next observation. A pragmatic concession to the
    /// driver's lack of explicit wait conditions.
    async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(self.config.settle_delay_ms)).await;
    }
}

/// Exponential backoff series: `base * 2^attempt`, capped.
pub fn backoff_delay(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    Duration::from_millis(base_ms.saturating_mul(factor).min(max_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        assert_eq!(backoff_delay(0, 2_000, 30_000), Duration::from_millis(2_000));
        assert_eq!(backoff_delay(1, 2_000, 30_000), Duration::from_millis(4_000));
        assert_eq!(backoff_delay(2, 2_000, 30_000), Duration::from_millis(8_000));
        assert_eq!(backoff_delay(3, 2_000, 30_000), Duration::from_millis(16_000));
        assert_eq!(backoff_delay(4, 2_000, 30_000), Duration::from_millis(30_000));
        assert_eq!(backoff_delay(10, 2_000, 30_000), Duration::from_millis(30_000));
    }

    #[test]
    fn test_backoff_survives_shift_overflow() {
        assert_eq!(backoff_delay(200, 2_000, 30_000), Duration::from_millis(30_000));
    }
}
