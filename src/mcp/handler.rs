//! # MCP Handler Module
//!
//! Dispatches JSON-RPC requests from the MCP client.
//!
//! ## Methods
//! - `initialize` - server info, protocol version and the `tools` capability
//! - `ping`
//! - `tools/list` - the static tool catalog
//! - `tools/call` - runs one tool against the wallet session
//!
//! Notifications are accepted and never answered.
//!
//! ## Tools
//! - `get-address` - wallet address
//! - `get-balance` - native or token balance
//! - `transfer-token` - native or ERC-20 transfer
//! - `swap-tokens` - router swap
//! - `buy-openrouter-credits` - OpenRouter credit quote payable in USDC

use std::panic::AssertUnwindSafe;

use anyhow::anyhow;
use futures::FutureExt;
use serde_json::{json, Map, Value};
use tracing::{error, info};

use crate::{
    blockchain::sdk::actions,
    mcp::{
        credits,
        errors::render_failure,
        mapping::{self, ConversionContext},
        protocol::{error_codes, Request, Response, ToolCallResult, PROTOCOL_VERSION},
        tools,
    },
    utils, AppState,
};

pub const SERVER_NAME: &str = "gasless_mcp";

/// This is the main dispatcher for all incoming MCP requests.
pub async fn handle_mcp_request(req: Request, state: AppState) -> Option<Response> {
    info!("Handling MCP request for method: {}", req.method);

    if req.is_notification() {
        return None;
    }

    let response = match req.method.as_str() {
        "initialize" => handle_initialize(&req),
        "ping" => Response::success(req.id, json!({})),
        "tools/list" => Response::success(req.id, tools::list_tools_result()),
        "tools/call" => handle_tool_call(req, &state).await,
        _ => Response::error(
            req.id,
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", req.method),
        ),
    };

    Some(response)
}

fn handle_initialize(req: &Request) -> Response {
    let server_info = json!({
        "name": SERVER_NAME,
        "version": env!("CARGO_PKG_VERSION")
    });
    let capabilities = json!({ "tools": { "listChanged": false } });
    let instructions = "Gasless wallet MCP server: address and balance queries, token \
                        transfers and swaps, and OpenRouter credit quotes.";

    Response::success(
        req.id.clone(),
        json!({
            "serverInfo": server_info,
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": capabilities,
            "instructions": instructions
        }),
    )
}

async fn handle_tool_call(req: Request, state: &AppState) -> Response {
    let params = match req.params.as_ref() {
        Some(p) => p,
        None => {
            return Response::error(
                req.id,
                error_codes::INVALID_PARAMS,
                "Missing 'params' object".into(),
            )
        }
    };

    let tool_name: String = match utils::get_required_arg(params, "name", &req.id) {
        Ok(name) => name,
        Err(resp) => return resp,
    };

    let args = match params.get("arguments") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => {
            return Response::error(
                req.id,
                error_codes::INVALID_PARAMS,
                "'arguments' must be an object".into(),
            )
        }
    };

    let result = call_tool(state, &tool_name, &args).await;
    Response::success(req.id, result.to_value())
}

/// Runs one tool. Every failure, including a panic inside the wallet client,
/// comes back as error text.
pub async fn call_tool(state: &AppState, name: &str, args: &Map<String, Value>) -> ToolCallResult {
    info!("Calling tool '{}'", name);
    match AssertUnwindSafe(run_tool(state, name, args)).catch_unwind().await {
        Ok(result) => result,
        Err(_) => {
            error!("Tool '{}' panicked", name);
            ToolCallResult::error(format!("Error: internal failure while running '{}'", name))
        }
    }
}

async fn run_tool(state: &AppState, name: &str, args: &Map<String, Value>) -> ToolCallResult {
    let session = match state.sessions.get_or_create(&state.config.private_key).await {
        Ok(session) => session,
        Err(e) => return ToolCallResult::error(render_failure(&e)),
    };

    let ctx = ConversionContext {
        chain_id: session.chain_id,
    };
    let (mapping, converted) = match mapping::convert(name, args, &ctx) {
        Ok(found) => found,
        Err(e) => return ToolCallResult::error(format!("Error: {}", e)),
    };

    let outcome = if mapping.sdk_action == actions::BUY_OPENROUTER_CREDITS {
        match converted.get("amountUsd").and_then(Value::as_f64) {
            Some(amount_usd) => credits::buy_credits(&session, state.credits.as_ref(), amount_usd)
                .await
                .map(Value::String),
            None => Err(anyhow!("amountUsd was not converted to a number")),
        }
    } else {
        session.sdk.run_action(mapping.sdk_action, converted).await
    };

    match outcome {
        Ok(value) => ToolCallResult::text(render_value(value)),
        Err(e) => ToolCallResult::error(render_failure(&e)),
    }
}

fn render_value(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
