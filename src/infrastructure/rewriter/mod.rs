//! Rewrite/analysis model adapter.

pub mod anthropic;
pub mod retry;

pub use anthropic::AnthropicRewriter;
pub use retry::{ApiError, RetryPolicy};
