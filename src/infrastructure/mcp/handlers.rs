//! MCP tool handlers for the optimizer.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::application::OptimizationLoop;
use crate::domain::errors::Error;
use crate::domain::models::OptimizeRequest;
use crate::infrastructure::mcp::types::{
    codes, JsonRpcRequest, JsonRpcResponse, ToolCallParams,
};

/// Application state for the MCP server.
#[derive(Clone)]
pub struct AppState {
    pub optimizer: Arc<OptimizationLoop>,
}

pub async fn handle_request(
    State(state): State<AppState>,
    Json(request): Json<JsonRpcRequest>,
) -> JsonRpcResponse {
    debug!(method = %request.method, "received request");
    let id = request.id.clone();

    match request.method.as_str() {
        "initialize" => handle_initialize(id),
        "tools/list" => handle_list_tools(id),
        "tools/call" => handle_tool_call(state, request).await,
        other => JsonRpcResponse::error(
            id,
            codes::METHOD_NOT_FOUND,
            format!("Method not found: {other}"),
        ),
    }
}

fn handle_initialize(id: Option<Value>) -> JsonRpcResponse {
    JsonRpcResponse::success(
        id,
        json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": "proofloop",
                "version": env!("CARGO_PKG_VERSION")
            }
        }),
    )
}

fn handle_list_tools(id: Option<Value>) -> JsonRpcResponse {
    JsonRpcResponse::success(
        id,
        json!({
            "tools": [
                {
                    "name": "optimize_text",
                    "description": "Score a text's AI-detection and plagiarism percentages in Grammarly and optionally rewrite it iteratively until configured thresholds are met",
                    "inputSchema": {
                        "type": "object",
                        "properties": {
                            "text": { "type": "string", "description": "The text to score or optimize" },
                            "mode": { "type": "string", "enum": ["optimize", "score_only", "analyze"], "description": "optimize (default), score_only, or analyze" },
                            "max_ai_percent": { "type": "number", "minimum": 0, "maximum": 100, "description": "AI-detection threshold (default 10)" },
                            "max_plagiarism_percent": { "type": "number", "minimum": 0, "maximum": 100, "description": "Plagiarism threshold (default 5)" },
                            "max_iterations": { "type": "integer", "minimum": 1, "maximum": 20, "description": "Rewrite budget (default 5)" },
                            "tone": { "description": "neutral, formal, informal, academic, or {\"custom\": \"...\"}" },
                            "domain_hint": { "type": "string", "description": "Subject-matter hint for rewrites" },
                            "custom_instructions": { "type": "string", "description": "Extra rewrite guidance" }
                        },
                        "required": ["text"]
                    }
                }
            ]
        }),
    )
}

async fn handle_tool_call(state: AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    let id = request.id.clone();
    let params: ToolCallParams = match request.params.map(serde_json::from_value).transpose() {
        Ok(Some(params)) => params,
        Ok(None) => {
            return JsonRpcResponse::error(id, codes::INVALID_PARAMS, "Missing params");
        }
        Err(err) => {
            return JsonRpcResponse::error(
                id,
                codes::INVALID_PARAMS,
                format!("Invalid params: {err}"),
            );
        }
    };

    match params.name.as_str() {
        "optimize_text" => {
            let optimize_request: OptimizeRequest =
                match serde_json::from_value(params.arguments) {
                    Ok(request) => request,
                    Err(err) => {
                        return JsonRpcResponse::error(
                            id,
                            codes::INVALID_PARAMS,
                            format!("Invalid arguments: {err}"),
                        );
                    }
                };

            match state.optimizer.run(&optimize_request).await {
                Ok(result) => {
                    let text = serde_json::to_string_pretty(&result).unwrap_or_default();
                    JsonRpcResponse::success(
                        id,
                        json!({
                            "content": [{ "type": "text", "text": text }]
                        }),
                    )
                }
                Err(Error::InvalidRequest(message)) => {
                    JsonRpcResponse::error(id, codes::INVALID_PARAMS, message)
                }
                Err(err) => {
                    error!(error = %err, "optimize_text failed");
                    // Authentication errors carry the remediation URL in
                    // the error data so callers can surface it.
                    let data = err
                        .debug_url()
                        .map(|url| json!({ "debug_url": url }));
                    JsonRpcResponse::error_with_data(
                        id,
                        codes::SERVER_ERROR,
                        err.to_string(),
                        data,
                    )
                }
            }
        }
        other => JsonRpcResponse::error(
            id,
            codes::METHOD_NOT_FOUND,
            format!("Unknown tool: {other}"),
        ),
    }
}
