//! Model tier selection for the rewrite service.

/// Rewrite model capability tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    Standard,
    Advanced,
}

/// Text length above which rewrites route to the advanced tier.
pub const LONG_TEXT_THRESHOLD: usize = 12_000;

/// Iteration depth above which rewrites route to the advanced tier. Deep
/// runs mean the standard model keeps failing to move the scores.
pub const DEEP_ITERATION_THRESHOLD: u32 = 8;

/// Pure tier selection: standard iff the text fits under
/// [`LONG_TEXT_THRESHOLD`] and the iteration count is at most
/// [`DEEP_ITERATION_THRESHOLD`]; both bounds inclusive.
pub fn choose_model_tier(text_length: usize, iterations: u32) -> ModelTier {
    if text_length <= LONG_TEXT_THRESHOLD && iterations <= DEEP_ITERATION_THRESHOLD {
        ModelTier::Standard
    } else {
        ModelTier::Advanced
    }
}
