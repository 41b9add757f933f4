//! Port trait for the external secrets collaborator.

use async_trait::async_trait;

use crate::domain::errors::Result;
use crate::domain::models::Credentials;

/// Resolves the editor account's credential pair from a secret store.
///
/// Resolution failures surface as [`crate::domain::errors::Error::Secrets`];
/// the scoring boundary rewraps them into an authentication error so the
/// caller always sees one distinguished type for "could not sign in".
#[async_trait]
pub trait SecretsResolver: Send + Sync {
    /// Fetch the credential pair. Called at most once per login attempt;
    /// the result is never cached or persisted.
    async fn resolve(&self) -> Result<Credentials>;
}
