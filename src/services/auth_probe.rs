//! Fresh authenticated/not-authenticated verdict for the current page.

use tracing::{debug, warn};

use crate::domain::models::AuthStatus;
use crate::domain::ports::PageHandle;

/// Observation query for signed-in indicators. Kept generic on purpose:
/// the avatar moves around between app releases.
const AUTH_INDICATOR_QUERY: &str =
    "user avatar, profile menu, or account button indicating a signed-in user";

/// Auth verdict plus the URL it was computed against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageAuthState {
    pub status: AuthStatus,
    pub current_url: String,
}

impl PageAuthState {
    pub fn is_authenticated(&self) -> bool {
        self.status.is_authenticated()
    }
}

/// Stateless probe. Every call computes a fresh verdict; nothing is cached
/// because the page can log itself out between any two steps.
pub struct AuthStatusProbe;

impl AuthStatusProbe {
    /// Probe a specific page. Always resolves to a verdict: observation
    /// failures count as not-authenticated (fail closed) rather than
    /// propagating.
    pub async fn check(page: &dyn PageHandle) -> PageAuthState {
        let current_url = match page.url().await {
            Ok(url) => url,
            Err(err) => {
                warn!(error = %err, "could not read page URL, treating as not authenticated");
                return PageAuthState {
                    status: AuthStatus::LoginRequired,
                    current_url: String::new(),
                };
            }
        };

        // Login-family pages settle the question without an agent
        // round-trip.
        if is_login_family_url(&current_url) {
            debug!(url = %current_url, "on a login-family page");
            return PageAuthState {
                status: AuthStatus::LoginRequired,
                current_url,
            };
        }

        let status = match page.observe(AUTH_INDICATOR_QUERY).await {
            Ok(observed) if !observed.is_empty() => AuthStatus::Authenticated,
            Ok(_) => AuthStatus::LoginRequired,
            Err(err) => {
                warn!(error = %err, "auth indicator observation failed, treating as not authenticated");
                AuthStatus::LoginRequired
            }
        };

        PageAuthState {
            status,
            current_url,
        }
    }
}

/// Whether a URL's path belongs to the sign-in flow.
pub fn is_login_family_url(raw: &str) -> bool {
    let path = url::Url::parse(raw)
        .map(|u| u.path().to_ascii_lowercase())
        .unwrap_or_else(|_| raw.to_ascii_lowercase());
    ["signin", "login", "signup"]
        .iter()
        .any(|marker| path.contains(marker))
}
