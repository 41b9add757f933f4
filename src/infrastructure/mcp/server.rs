//! HTTP MCP server for the optimizer.

use std::sync::Arc;

use anyhow::Result;
use axum::{routing::post, Router};
use tracing::info;

use crate::application::OptimizationLoop;
use crate::infrastructure::mcp::handlers::{handle_request, AppState};

/// Build the JSON-RPC router. Split from [`serve`] so tests can drive
/// the router directly without binding a socket.
pub fn router(optimizer: Arc<OptimizationLoop>) -> Router {
    let state = AppState { optimizer };
    Router::new().route("/", post(handle_request)).with_state(state)
}

/// Bind and serve the MCP endpoint until the process exits.
pub async fn serve(optimizer: Arc<OptimizationLoop>, port: u16) -> Result<()> {
    let app = router(optimizer);
    let addr = format!("127.0.0.1:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("MCP server listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
