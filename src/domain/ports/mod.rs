//! Port traits for external collaborators.
//!
//! The services layer depends on these traits only; concrete adapters
//! live in `infrastructure`.

pub mod browser;
pub mod rewriter;
pub mod secrets;

pub use browser::{
    ActTarget, BrowserDriver, BrowserSession, ObservedElement, PageHandle, WaitPolicy,
};
pub use rewriter::{RewriteOutcome, RewriteRequest, RewriteService};
pub use secrets::SecretsResolver;
