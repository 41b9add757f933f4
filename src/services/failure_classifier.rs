//! Keyword classification of login-error UI text.
//!
//! Classification is a heuristic over observed element descriptions, not a
//! guarantee. Priority order is fixed and significant when keywords
//! co-occur: CAPTCHA beats rate-limit beats invalid-credential beats the
//! generic bucket. A CAPTCHA page often also says "try again later", and
//! misreading it as rate-limited would suggest the wrong remediation.

use tracing::{debug, warn};

use crate::domain::models::LoginFailure;
use crate::domain::ports::{ObservedElement, PageHandle};

const FAILURE_QUERY: &str =
    "error messages, CAPTCHA challenges, or rate limit warnings visible on the page";

/// Highest priority tier: human-verification walls.
const CAPTCHA_KEYWORDS: &[&str] = &[
    "captcha",
    "robot",
    "human verification",
    "verify you are human",
    "security check",
];

/// Second tier: throttling.
const RATE_LIMIT_KEYWORDS: &[&str] = &[
    "too many attempts",
    "too many requests",
    "rate limit",
    "temporarily blocked",
    "try again later",
];

/// Third tier: credential rejection.
const INVALID_CREDENTIAL_KEYWORDS: &[&str] = &[
    "incorrect email",
    "incorrect password",
    "invalid email",
    "invalid password",
    "wrong password",
    "couldn't find an account",
    "couldn't find your account",
    "doesn't match",
    "no account found",
];

/// What the classifier concluded from the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureVerdict {
    /// A specific, terminal failure reason was recognized.
    Classified(LoginFailure, String),
    /// An error is visibly present but matches no known tier. Retryable.
    Generic(String),
}

impl FailureVerdict {
    pub fn failure(&self) -> Option<LoginFailure> {
        match self {
            Self::Classified(failure, _) => Some(*failure),
            Self::Generic(_) => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Classified(_, message) | Self::Generic(message) => message,
        }
    }
}

/// Observe the page once and classify whatever error text is showing.
///
/// Returns `None` when the observation is empty or itself fails; this
/// function never errors. An inconclusive classification leaves the retry
/// decision to the caller.
pub async fn classify_login_failure(page: &dyn PageHandle) -> Option<FailureVerdict> {
    match page.observe(FAILURE_QUERY).await {
        Ok(observed) => {
            let verdict = classify_observations(&observed);
            debug!(?verdict, observed = observed.len(), "login failure classification");
            verdict
        }
        Err(err) => {
            warn!(error = %err, "failure observation errored, leaving attempt unclassified");
            None
        }
    }
}

/// Pure classification over observed descriptions. `None` for an empty
/// observation; otherwise the first matching tier in priority order wins.
pub fn classify_observations(observed: &[ObservedElement]) -> Option<FailureVerdict> {
    if observed.is_empty() {
        return None;
    }

    let text = observed
        .iter()
        .map(|el| el.description.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    let tiers: [(&[&str], LoginFailure); 3] = [
        (CAPTCHA_KEYWORDS, LoginFailure::CaptchaDetected),
        (RATE_LIMIT_KEYWORDS, LoginFailure::RateLimited),
        (INVALID_CREDENTIAL_KEYWORDS, LoginFailure::InvalidCredentials),
    ];

    for (keywords, failure) in tiers {
        if keywords.iter().any(|kw| text.contains(kw)) {
            return Some(FailureVerdict::Classified(failure, failure.to_string()));
        }
    }

    Some(FailureVerdict::Generic("login error detected".to_string()))
}
