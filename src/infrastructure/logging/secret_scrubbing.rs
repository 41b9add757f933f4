//! Scrubs secrets from log output before it leaves the process.
//!
//! Targets the secrets this system actually handles: the editor account
//! password, 1Password Connect tokens, and Anthropic API keys.

use regex::Regex;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use tracing_subscriber::fmt::MakeWriter;

/// Scrubber applied to any message that might echo request payloads.
#[derive(Clone)]
pub struct SecretScrubber {
    api_key_pattern: Regex,
    bearer_pattern: Regex,
    password_pattern: Regex,
    connect_token_pattern: Regex,
}

impl SecretScrubber {
    pub fn new() -> Self {
        Self {
            // Anthropic API keys: sk-ant-api03-...
            api_key_pattern: Regex::new(r"sk-ant-[a-zA-Z0-9-_]{20,}").unwrap(),
            // Bearer tokens in Authorization headers
            bearer_pattern: Regex::new(r"Bearer\s+[a-zA-Z0-9-_\.]+").unwrap(),
            // password fields in serialized payloads
            password_pattern: Regex::new(
                r#"["']?password["']?\s*[:=]\s*["']?([^"'\s,}]+)["']?"#,
            )
            .unwrap(),
            // 1Password Connect tokens are JWTs
            connect_token_pattern: Regex::new(
                r"eyJ[a-zA-Z0-9-_]+\.[a-zA-Z0-9-_]+\.[a-zA-Z0-9-_]+",
            )
            .unwrap(),
        }
    }

    /// Scrub a message of sensitive data.
    pub fn scrub(&self, message: &str) -> String {
        let scrubbed = self
            .api_key_pattern
            .replace_all(message, "[API_KEY_REDACTED]");
        let scrubbed = self
            .bearer_pattern
            .replace_all(&scrubbed, "Bearer [TOKEN_REDACTED]");
        let scrubbed = self
            .connect_token_pattern
            .replace_all(&scrubbed, "[TOKEN_REDACTED]");
        self.password_pattern
            .replace_all(&scrubbed, "password=[REDACTED]")
            .to_string()
    }
}

impl Default for SecretScrubber {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SecretScrubber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretScrubber").finish()
    }
}

/// `MakeWriter` adapter running every formatted record through the
/// scrubber before the inner writer sees it. Wraps both the stderr and
/// file writers in the logger setup.
#[derive(Clone)]
pub struct ScrubbingMakeWriter<M> {
    inner: M,
    scrubber: Arc<SecretScrubber>,
}

impl<M> ScrubbingMakeWriter<M> {
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            scrubber: Arc::new(SecretScrubber::new()),
        }
    }
}

impl<'a, M: MakeWriter<'a>> MakeWriter<'a> for ScrubbingMakeWriter<M> {
    type Writer = ScrubbingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        ScrubbingWriter {
            inner: self.inner.make_writer(),
            scrubber: Arc::clone(&self.scrubber),
        }
    }
}

pub struct ScrubbingWriter<W> {
    inner: W,
    scrubber: Arc<SecretScrubber>,
}

impl<W: Write> Write for ScrubbingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // Formatted tracing records arrive as whole lines, so scrubbing
        // per write call cannot split a secret across two buffers.
        let text = String::from_utf8_lossy(buf);
        self.inner.write_all(self.scrubber.scrub(&text).as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrub_anthropic_api_key() {
        let scrubber = SecretScrubber::new();
        let message = "Using API key sk-ant-REDACTED for request";
        let scrubbed = scrubber.scrub(message);
        assert!(!scrubbed.contains("sk-ant-api03"));
        assert!(scrubbed.contains("[API_KEY_REDACTED]"));
    }

    #[test]
    fn test_scrub_bearer_token() {
        let scrubber = SecretScrubber::new();
        let scrubbed = scrubber.scrub("Authorization: Bearer abc.def.ghi");
        assert!(scrubbed.contains("Bearer [TOKEN_REDACTED]"));
        assert!(!scrubbed.contains("abc.def.ghi"));
    }

    #[test]
    fn test_scrub_password_field() {
        let scrubber = SecretScrubber::new();
        let scrubbed = scrubber.scrub(r#"{"username":"u@example.com","password":"hunter2"}"#);
        assert!(!scrubbed.contains("hunter2"));
        assert!(scrubbed.contains("password=[REDACTED]"));
    }

    #[test]
    fn test_scrub_connect_jwt() {
        let scrubber = SecretScrubber::new();
        let scrubbed = scrubber.scrub("token eyJhbGciOi.eyJzdWIiOiIx.SflKxwRJSM");
        assert!(!scrubbed.contains("eyJhbGciOi.eyJzdWIiOiIx.SflKxwRJSM"));
        assert!(scrubbed.contains("[TOKEN_REDACTED]"));
    }

    #[test]
    fn test_plain_messages_untouched() {
        let scrubber = SecretScrubber::new();
        let message = "login attempt 2 failed, may retry";
        assert_eq!(scrubber.scrub(message), message);
    }
}
