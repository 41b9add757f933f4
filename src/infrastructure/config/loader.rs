use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration error types.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Automation base_url cannot be empty")]
    EmptyAutomationUrl,

    #[error("App url cannot be empty")]
    EmptyAppUrl,

    #[error(
        "Invalid backoff configuration: base_backoff_ms ({0}) must be at most max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("1Password {0} cannot be empty when the integration is configured")]
    IncompleteOnePassword(&'static str),
}

/// Configuration loader with hierarchical merging.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .proofloop/config.yaml (project config, created by init)
    /// 3. .proofloop/local.yaml (local overrides, optional)
    /// 4. Environment variables (`PROOFLOOP_*` prefix, `__` nesting)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".proofloop/config.yaml"))
            .merge(Yaml::file(".proofloop/local.yaml"))
            .merge(Env::prefixed("PROOFLOOP_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, plus env overrides.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("PROOFLOOP_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading.
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.automation.base_url.is_empty() {
            return Err(ConfigError::EmptyAutomationUrl);
        }

        if config.app.url.is_empty() {
            return Err(ConfigError::EmptyAppUrl);
        }

        if config.login.base_backoff_ms > config.login.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.login.base_backoff_ms,
                config.login.max_backoff_ms,
            ));
        }

        if let Some(op) = &config.onepassword {
            if op.connect_url.is_empty() {
                return Err(ConfigError::IncompleteOnePassword("connect_url"));
            }
            if op.username_ref.is_empty() {
                return Err(ConfigError::IncompleteOnePassword("username_ref"));
            }
            if op.password_ref.is_empty() {
                return Err(ConfigError::IncompleteOnePassword("password_ref"));
            }
        }

        Ok(())
    }
}
