//! Process-wide tracing initialization. Called once from `main` (or the
//! serve command); library code only uses the `tracing` facade, so tests
//! run against the default no-op subscriber.

use anyhow::{anyhow, Result};
use std::io;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::domain::models::LoggingConfig;
use crate::infrastructure::logging::secret_scrubbing::ScrubbingMakeWriter;

/// Holds the non-blocking writer guard; logging stops flushing when this
/// is dropped, so keep it alive for the process lifetime.
pub struct LoggerGuard {
    _guard: Option<WorkerGuard>,
}

/// Initialize the global subscriber from config.
///
/// Stderr always gets a layer in the configured format; when a log file
/// is configured it additionally receives JSON lines via a daily-rolling
/// non-blocking appender.
pub fn init(config: &LoggingConfig) -> Result<LoggerGuard> {
    let default_level = parse_log_level(&config.level)?;
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let guard = if let Some(file) = &config.file {
        let path = std::path::Path::new(file);
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let name = path
            .file_name()
            .map_or_else(|| "proofloop.log".to_string(), |n| n.to_string_lossy().into_owned());
        let (writer, guard) = tracing_appender::non_blocking(rolling::daily(dir, name));

        let file_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(ScrubbingMakeWriter::new(writer))
            .with_ansi(false)
            .with_target(true)
            .with_filter(env_filter);

        let stderr_filter = EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy();
        match config.format.as_str() {
            "json" => {
                let stderr_layer = tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(ScrubbingMakeWriter::new(io::stderr))
                    .with_filter(stderr_filter);
                tracing_subscriber::registry()
                    .with(file_layer)
                    .with(stderr_layer)
                    .init();
            }
            _ => {
                let stderr_layer = tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(ScrubbingMakeWriter::new(io::stderr))
                    .with_filter(stderr_filter);
                tracing_subscriber::registry()
                    .with(file_layer)
                    .with(stderr_layer)
                    .init();
            }
        }
        Some(guard)
    } else {
        match config.format.as_str() {
            "json" => {
                let stderr_layer = tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(ScrubbingMakeWriter::new(io::stderr))
                    .with_filter(env_filter);
                tracing_subscriber::registry().with(stderr_layer).init();
            }
            _ => {
                let stderr_layer = tracing_subscriber::fmt::layer()
                    .with_writer(ScrubbingMakeWriter::new(io::stderr))
                    .with_filter(env_filter);
                tracing_subscriber::registry().with(stderr_layer).init();
            }
        }
        None
    };

    Ok(LoggerGuard { _guard: guard })
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(anyhow!("unknown log level: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("debug").unwrap(), Level::DEBUG);
        assert_eq!(parse_log_level("warn").unwrap(), Level::WARN);
        assert!(parse_log_level("loud").is_err());
    }
}
