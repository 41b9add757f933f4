//! JSON-RPC surface tests for the MCP server.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::Json;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use common::{scores_json, FakeDriver, FakePage, FakeRewriter, APP_URL};
use proofloop::application::OptimizationLoop;
use proofloop::domain::models::{AppConfig, LoginConfig};
use proofloop::infrastructure::mcp::handlers::{handle_request, AppState};
use proofloop::infrastructure::mcp::server::router;
use proofloop::infrastructure::mcp::types::{codes, JsonRpcRequest};
use proofloop::services::ScoringTaskRunner;

fn scripted_optimizer(page: Arc<FakePage>) -> Arc<OptimizationLoop> {
    let driver = Arc::new(FakeDriver::with_page(page));
    let login = LoginConfig {
        settle_delay_ms: 10,
        ..LoginConfig::default()
    };
    let runner = ScoringTaskRunner::new(driver.clone(), None, AppConfig::default(), login);
    Arc::new(OptimizationLoop::new(
        driver,
        Arc::new(FakeRewriter::default()),
        runner,
        "test-profile",
    ))
}

fn happy_page() -> Arc<FakePage> {
    let page = Arc::new(FakePage::at(APP_URL));
    page.set_authenticated_by_default(true);
    page.push_extract_ok(scores_json(Some(4.0), Some(1.0)));
    page
}

fn rpc(method: &str, params: Option<Value>) -> JsonRpcRequest {
    JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        id: Some(json!(1)),
        method: method.to_string(),
        params,
    }
}

#[tokio::test]
async fn initialize_reports_server_info() {
    let state = AppState {
        optimizer: scripted_optimizer(happy_page()),
    };

    let response = handle_request(State(state), Json(rpc("initialize", None))).await;

    let result = response.result.expect("initialize succeeds");
    assert_eq!(result["serverInfo"]["name"], "proofloop");
    assert_eq!(result["protocolVersion"], "2024-11-05");
}

#[tokio::test]
async fn tools_list_exposes_optimize_text() {
    let state = AppState {
        optimizer: scripted_optimizer(happy_page()),
    };

    let response = handle_request(State(state), Json(rpc("tools/list", None))).await;

    let result = response.result.expect("tools/list succeeds");
    let tools = result["tools"].as_array().expect("tools array");
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["name"], "optimize_text");
    let required = tools[0]["inputSchema"]["required"].as_array().unwrap();
    assert_eq!(required, &[json!("text")]);
}

#[tokio::test]
async fn unknown_method_returns_method_not_found() {
    let state = AppState {
        optimizer: scripted_optimizer(happy_page()),
    };

    let response = handle_request(State(state), Json(rpc("resources/list", None))).await;

    let error = response.error.expect("unknown method errors");
    assert_eq!(error.code, codes::METHOD_NOT_FOUND);
    assert!(error.message.contains("resources/list"));
}

#[tokio::test]
async fn tool_call_returns_result_as_text_content() {
    let state = AppState {
        optimizer: scripted_optimizer(happy_page()),
    };

    let params = json!({
        "name": "optimize_text",
        "arguments": { "text": "a paragraph to score", "mode": "score_only" }
    });
    let response = handle_request(State(state), Json(rpc("tools/call", Some(params)))).await;

    let result = response.result.expect("tool call succeeds");
    let content = result["content"].as_array().expect("content array");
    assert_eq!(content[0]["type"], "text");

    let payload: Value =
        serde_json::from_str(content[0]["text"].as_str().unwrap()).expect("result is JSON");
    assert_eq!(payload["thresholds_met"], json!(true));
    assert_eq!(payload["iterations_used"], json!(0));
}

#[tokio::test]
async fn missing_params_are_invalid() {
    let state = AppState {
        optimizer: scripted_optimizer(happy_page()),
    };

    let response = handle_request(State(state), Json(rpc("tools/call", None))).await;

    let error = response.error.expect("missing params error");
    assert_eq!(error.code, codes::INVALID_PARAMS);
}

#[tokio::test]
async fn empty_text_maps_to_invalid_params() {
    let state = AppState {
        optimizer: scripted_optimizer(happy_page()),
    };

    let params = json!({
        "name": "optimize_text",
        "arguments": { "text": "   " }
    });
    let response = handle_request(State(state), Json(rpc("tools/call", Some(params)))).await;

    let error = response.error.expect("validation error");
    assert_eq!(error.code, codes::INVALID_PARAMS);
}

#[tokio::test]
async fn unknown_tool_is_rejected() {
    let state = AppState {
        optimizer: scripted_optimizer(happy_page()),
    };

    let params = json!({ "name": "delete_everything", "arguments": {} });
    let response = handle_request(State(state), Json(rpc("tools/call", Some(params)))).await;

    let error = response.error.expect("unknown tool error");
    assert_eq!(error.code, codes::METHOD_NOT_FOUND);
}

#[tokio::test]
async fn authentication_failure_carries_debug_url_data() {
    let page = Arc::new(FakePage::at(APP_URL));
    page.set_authenticated_by_default(false);
    let state = AppState {
        optimizer: scripted_optimizer(page),
    };

    let params = json!({
        "name": "optimize_text",
        "arguments": { "text": "a paragraph to score", "mode": "score_only" }
    });
    let response = handle_request(State(state), Json(rpc("tools/call", Some(params)))).await;

    let error = response.error.expect("auth error");
    assert_eq!(error.code, codes::SERVER_ERROR);
    let data = error.data.expect("error data");
    assert_eq!(data["debug_url"], "https://dbg.example/session-1");
}

#[tokio::test]
async fn router_serves_json_rpc_over_http() {
    let app = router(scripted_optimizer(happy_page()));

    let body = serde_json::to_vec(&rpc("tools/list", None)).unwrap();
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let parsed: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(parsed["jsonrpc"], "2.0");
    assert!(parsed["result"]["tools"].is_array());
}
