//! MCP tool surface: JSON-RPC 2.0 over HTTP.

pub mod handlers;
pub mod server;
pub mod types;

pub use handlers::AppState;
pub use server::{router, serve};
