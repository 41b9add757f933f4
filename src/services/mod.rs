//! Core services: the auth probe, failure classifier, login state
//! machine, scoring runner, and supporting pure helpers.

pub mod auth_probe;
pub mod failure_classifier;
pub mod login;
pub mod model_router;
pub mod scoring;
pub mod timeout;

pub use auth_probe::{is_login_family_url, AuthStatusProbe, PageAuthState};
pub use failure_classifier::{classify_login_failure, classify_observations, FailureVerdict};
pub use login::{backoff_delay, LoginStateMachine};
pub use model_router::{choose_model_tier, ModelTier};
pub use scoring::{truncate_for_editor, ScoringOptions, ScoringTaskRunner, MAX_EDITOR_TEXT_LEN};
pub use timeout::with_timeout;
