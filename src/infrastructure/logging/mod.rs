//! Logging infrastructure: tracing initialization and secret scrubbing.

pub mod logger;
pub mod secret_scrubbing;

pub use logger::{init, LoggerGuard};
pub use secret_scrubbing::SecretScrubber;
