//! Authentication domain types: credentials, probe results, and login
//! attempt outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A username/password pair resolved from the secret store.
///
/// Deliberately does not implement `Serialize` or derive `Debug`: the
/// password must never reach logs, JSON payloads, or any natural-language
/// instruction sent to the automation layer. The manual `Debug` impl
/// redacts both fields.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &"[redacted]")
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Result of probing the app for an existing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    /// The editor surface is reachable; no login needed.
    Authenticated,
    /// The app redirected to a login-family page or hid the editor.
    LoginRequired,
}

impl AuthStatus {
    pub fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

/// Classified reason a login attempt failed.
///
/// Classification is keyword-based and ordered: CAPTCHA takes priority over
/// rate limiting, which takes priority over credential rejection. A failure
/// that matches none of these stays unclassified (`None` on the attempt
/// result) and is considered retryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginFailure {
    InvalidCredentials,
    CaptchaDetected,
    RateLimited,
}

impl fmt::Display for LoginFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::CaptchaDetected => write!(f, "CAPTCHA challenge detected"),
            Self::RateLimited => write!(f, "rate limited"),
        }
    }
}

/// Outcome of one full login attempt (all retries included).
///
/// Invariant: `success == true` implies `error == None` and
/// `failure == None`; at most one classified failure is ever set.
/// Construct through the helpers to preserve this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoginAttemptResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<LoginFailure>,
}

impl LoginAttemptResult {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            error: None,
            failure: None,
        }
    }

    pub fn failed(error: impl Into<String>, failure: Option<LoginFailure>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            failure,
        }
    }
}
