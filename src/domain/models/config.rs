//! Configuration tree, loaded hierarchically by
//! [`crate::infrastructure::config::ConfigLoader`].

use serde::{Deserialize, Serialize};

/// Main configuration structure for proofloop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Target application URLs and browser profile.
    #[serde(default)]
    pub app: AppConfig,

    /// Login retry and backoff tuning.
    #[serde(default)]
    pub login: LoginConfig,

    /// Browser-automation driver endpoint.
    #[serde(default)]
    pub automation: AutomationConfig,

    /// 1Password Connect integration. Absent means auto-login is disabled
    /// and an unauthenticated session fails fast with a remediation URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onepassword: Option<OnePasswordConfig>,

    /// Rewrite/analysis model endpoint.
    #[serde(default)]
    pub rewriter: RewriterConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// MCP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
}

/// Target application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    /// Canonical editor URL.
    #[serde(default = "default_app_url")]
    pub url: String,

    /// Sign-in page URL.
    #[serde(default = "default_login_url")]
    pub login_url: String,

    /// Browser profile reference passed to session creation, so cookies
    /// persist between invocations on the provider side.
    #[serde(default = "default_profile")]
    pub profile: String,
}

fn default_app_url() -> String {
    "https://app.grammarly.com".to_string()
}

fn default_login_url() -> String {
    "https://www.grammarly.com/signin".to_string()
}

fn default_profile() -> String {
    "proofloop".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            url: default_app_url(),
            login_url: default_login_url(),
            profile: default_profile(),
        }
    }
}

/// Login retry policy. Classified failures (wrong password, CAPTCHA, rate
/// limit) never retry regardless of these settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoginConfig {
    /// Extra attempts beyond the first.
    #[serde(default = "default_login_max_retries")]
    pub max_retries: u32,

    /// Initial backoff between attempts, doubled per attempt.
    #[serde(default = "default_login_base_backoff_ms")]
    pub base_backoff_ms: u64,

    /// Backoff ceiling.
    #[serde(default = "default_login_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Fixed pause after each UI-mutating step, letting asynchronous page
    /// updates settle before the next observation.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

const fn default_login_max_retries() -> u32 {
    1
}

const fn default_login_base_backoff_ms() -> u64 {
    2_000
}

const fn default_login_max_backoff_ms() -> u64 {
    30_000
}

const fn default_settle_delay_ms() -> u64 {
    1_500
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            max_retries: default_login_max_retries(),
            base_backoff_ms: default_login_base_backoff_ms(),
            max_backoff_ms: default_login_max_backoff_ms(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

/// Browser-automation driver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AutomationConfig {
    /// Base URL of the automation service's REST API.
    #[serde(default = "default_automation_url")]
    pub base_url: String,

    /// API key; usually injected via `PROOFLOOP_AUTOMATION__API_KEY`.
    #[serde(default)]
    pub api_key: String,

    /// Per-request timeout.
    #[serde(default = "default_automation_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_automation_url() -> String {
    "http://127.0.0.1:4800".to_string()
}

const fn default_automation_timeout_secs() -> u64 {
    120
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            base_url: default_automation_url(),
            api_key: String::new(),
            timeout_secs: default_automation_timeout_secs(),
        }
    }
}

/// 1Password Connect configuration. Field references use the
/// `vault/item/field` form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OnePasswordConfig {
    pub connect_url: String,

    /// Connect access token; usually injected via
    /// `PROOFLOOP_ONEPASSWORD__TOKEN`.
    pub token: String,

    pub username_ref: String,

    pub password_ref: String,
}

/// Rewrite model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RewriterConfig {
    #[serde(default = "default_rewriter_base_url")]
    pub base_url: String,

    /// Anthropic API key; usually injected via
    /// `PROOFLOOP_REWRITER__API_KEY`.
    #[serde(default)]
    pub api_key: String,

    /// Model used for ordinary rewrites.
    #[serde(default = "default_standard_model")]
    pub standard_model: String,

    /// Model used for long texts or deep iteration counts.
    #[serde(default = "default_advanced_model")]
    pub advanced_model: String,

    #[serde(default = "default_rewriter_max_tokens")]
    pub max_tokens: usize,
}

fn default_rewriter_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_standard_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_advanced_model() -> String {
    "claude-opus-4-20250514".to_string()
}

const fn default_rewriter_max_tokens() -> usize {
    8192
}

impl Default for RewriterConfig {
    fn default() -> Self {
        Self {
            base_url: default_rewriter_base_url(),
            api_key: String::new(),
            standard_model: default_standard_model(),
            advanced_model: default_advanced_model(),
            max_tokens: default_rewriter_max_tokens(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty.
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Optional log file; stderr only when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

/// MCP server configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServerConfig {
    #[serde(default = "default_server_port")]
    pub port: u16,
}

const fn default_server_port() -> u16 {
    4876
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
        }
    }
}
