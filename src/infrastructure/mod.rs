//! Infrastructure layer: adapters for external collaborators plus
//! configuration and logging.

pub mod automation;
pub mod config;
pub mod logging;
pub mod mcp;
pub mod rewriter;
pub mod secrets;
