//! Domain models.

pub mod config;
pub mod login;
pub mod request;
pub mod scores;

pub use config::{
    AppConfig, AutomationConfig, Config, LoggingConfig, LoginConfig, OnePasswordConfig,
    RewriterConfig, ServerConfig,
};
pub use login::{AuthStatus, Credentials, LoginAttemptResult, LoginFailure};
pub use request::{Mode, OptimizeRequest, Tone, MAX_ITERATIONS_CAP};
pub use scores::{GrammarlyScores, HistoryEntry, OptimizeResult, Thresholds};
