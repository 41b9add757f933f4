//! CLI command implementations.

pub mod init;
pub mod run;
pub mod serve;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::application::OptimizationLoop;
use crate::domain::models::Config;
use crate::domain::ports::SecretsResolver;
use crate::infrastructure::automation::AutomationClient;
use crate::infrastructure::rewriter::AnthropicRewriter;
use crate::infrastructure::secrets::OnePasswordResolver;
use crate::services::ScoringTaskRunner;

/// Wire the concrete adapters into an optimization loop.
pub(crate) fn build_optimizer(config: &Config) -> Result<OptimizationLoop> {
    let driver = Arc::new(
        AutomationClient::new(&config.automation)
            .context("Failed to build automation client")?,
    );

    let secrets: Option<Arc<dyn SecretsResolver>> = match &config.onepassword {
        Some(op) => Some(Arc::new(
            OnePasswordResolver::new(op).context("Failed to build 1Password resolver")?,
        )),
        None => None,
    };

    let rewriter = Arc::new(
        AnthropicRewriter::new(&config.rewriter).context("Failed to build rewriter client")?,
    );

    let runner = ScoringTaskRunner::new(
        driver.clone(),
        secrets,
        config.app.clone(),
        config.login,
    );

    Ok(OptimizationLoop::new(
        driver,
        rewriter,
        runner,
        config.app.profile.clone(),
    ))
}
