//! proofloop - iterative AI-detection and plagiarism score optimizer.
//!
//! Drives the Grammarly web editor through a browser-automation agent,
//! interleaving LLM rewrites until configured thresholds are met or an
//! iteration budget is exhausted. Exposed as an MCP tool and a CLI.
//!
//! # Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - **Domain** (`domain`): models, failure taxonomy, collaborator ports
//! - **Services** (`services`): auth probe, failure classifier, login
//!   state machine, scoring runner
//! - **Application** (`application`): the optimization control loop
//! - **Infrastructure** (`infrastructure`): HTTP adapters, config,
//!   logging, the MCP server
//! - **CLI** (`cli`): command-line interface
//!
//! External collaborators (the automation driver, the secrets store, the
//! rewrite model) are consumed through port traits, so the core flow is
//! testable against scripted fakes.

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{OptimizationLoop, ProgressFn};
pub use domain::errors::{Error, Result};
pub use domain::models::{
    AuthStatus, Config, Credentials, GrammarlyScores, HistoryEntry, LoginAttemptResult,
    LoginFailure, Mode, OptimizeRequest, OptimizeResult, Thresholds, Tone,
};
pub use domain::ports::{
    ActTarget, BrowserDriver, BrowserSession, ObservedElement, PageHandle, RewriteOutcome,
    RewriteRequest, RewriteService, SecretsResolver, WaitPolicy,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{AuthStatusProbe, LoginStateMachine, ScoringOptions, ScoringTaskRunner};
