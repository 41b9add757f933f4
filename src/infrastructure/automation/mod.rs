//! Browser-automation driver adapter.

pub mod client;

pub use client::AutomationClient;
