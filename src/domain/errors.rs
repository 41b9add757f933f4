//! Failure taxonomy for the optimizer.
//!
//! Callers are expected to pattern-match on `AuthenticationRequired` (it
//! carries a remediation URL); every other variant is surfaced as-is.

use thiserror::Error;

/// Errors that can occur while driving the editor and the optimization loop.
#[derive(Debug, Error)]
pub enum Error {
    /// The browser context exposes zero pages. Fatal, no recovery.
    #[error("Browser context has no open page")]
    NoPage,

    /// The editor requires a signed-in session and none could be established.
    ///
    /// `debug_url` points at the live automation session so an operator can
    /// take over (solve a CAPTCHA, complete a verification step).
    #[error("Authentication required: {message}")]
    AuthenticationRequired {
        message: String,
        debug_url: Option<String>,
    },

    /// An async operation exceeded its deadline.
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Navigation completed but the network-idle wait did not settle in time.
    /// Distinguished from [`Error::Automation`] because callers tolerate it:
    /// the page is usually already interactive.
    #[error("Timed out waiting for network idle on {url}")]
    NavigationTimeout { url: String },

    /// Browser-automation driver failure (transport, observe, act).
    #[error("Automation driver error: {0}")]
    Automation(String),

    /// Credential resolution failure from the secrets collaborator.
    #[error("1Password error: {0}")]
    Secrets(String),

    /// Rewrite/analysis service failure.
    #[error("Rewrite service error: {0}")]
    Rewrite(String),

    /// Structured score extraction failed (primary attempt; any fallback
    /// failure is logged and suppressed in favor of this one).
    #[error("Score extraction failed: {0}")]
    Extraction(String),

    /// The request failed boundary validation before any session existed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl Error {
    /// Build an authentication error, preserving the session debug handle.
    pub fn authentication(message: impl Into<String>, debug_url: Option<String>) -> Self {
        Self::AuthenticationRequired {
            message: message.into(),
            debug_url,
        }
    }

    /// True when the caller should surface a sign-in remediation path.
    pub fn is_authentication_required(&self) -> bool {
        matches!(self, Self::AuthenticationRequired { .. })
    }

    /// Debug URL attached to an authentication failure, if any.
    pub fn debug_url(&self) -> Option<&str> {
        match self {
            Self::AuthenticationRequired { debug_url, .. } => debug_url.as_deref(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_error_carries_debug_url() {
        let err = Error::authentication("session expired", Some("https://dbg.example/s/1".into()));
        assert!(err.is_authentication_required());
        assert_eq!(err.debug_url(), Some("https://dbg.example/s/1"));
    }

    #[test]
    fn test_non_auth_errors_have_no_debug_url() {
        assert_eq!(Error::NoPage.debug_url(), None);
        assert!(!Error::NoPage.is_authentication_required());
        assert_eq!(Error::Automation("boom".into()).debug_url(), None);
    }

    #[test]
    fn test_secrets_error_message_prefix() {
        let err = Error::Secrets("token rejected".into());
        assert!(err.to_string().starts_with("1Password error"));
    }
}
