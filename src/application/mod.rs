//! Application layer: use-case orchestration.

pub mod optimize_loop;

pub use optimize_loop::{OptimizationLoop, ProgressFn};
