//! MCP Protocol Dispatch
//!
//! Routes JSON-RPC methods to the `Handler`.
//!
//! Spans follow the OpenTelemetry JSON-RPC semantic conventions.
//! See: https://opentelemetry.io/docs/specs/semconv/rpc/json-rpc/

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::Instrument;

use crate::transport::McpState;
use crate::types::error::ErrorData;
use crate::types::jsonrpc::JsonRpcMessage;
use crate::types::prompt::{GetPromptResult, ListPromptsResult, Prompt};
use crate::types::protocol::{InitializeParams, InitializeResult, Implementation, ServerCapabilities};
use crate::types::tool::{CallToolParams, CallToolResult, ListToolsResult, Tool};

/// Handler trait for MCP server implementations.
///
/// Implement this trait to provide tools and prompts.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Return the list of available tools.
    fn tools(&self) -> Vec<Tool>;

    /// Execute a tool call.
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, ErrorData>;

    /// Return server implementation info.
    fn server_info(&self) -> Implementation;

    /// Return the list of available prompts.
    fn prompts(&self) -> Vec<Prompt> {
        vec![]
    }

    /// Render a prompt by name with arguments.
    async fn get_prompt(
        &self,
        _name: &str,
        _arguments: HashMap<String, String>,
    ) -> Result<GetPromptResult, ErrorData> {
        Err(ErrorData::method_not_found("prompts/get"))
    }

    /// Return instructions for the LLM.
    fn instructions(&self) -> Option<String> {
        None
    }

    fn capabilities(&self) -> ServerCapabilities {
        let caps = ServerCapabilities::default().enable_tools();

        if self.prompts().is_empty() {
            caps
        } else {
            caps.enable_prompts()
        }
    }
}

/// Dispatch a JSON-RPC message to the appropriate handler.
///
/// Notifications resolve to `Value::Null`; transports must not answer them.
pub async fn dispatch<H: Handler>(
    state: &Arc<McpState<H>>,
    session_id: &str,
    message: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    let request_id = message
        .id
        .as_ref()
        .map(|id| id.to_string())
        .unwrap_or_default();

    let span = tracing::info_span!(
        "mcp.dispatch",
        rpc.system = "jsonrpc",
        rpc.method = %message.method,
        rpc.jsonrpc.version = "2.0",
        rpc.jsonrpc.request_id = %request_id,
        mcp.session_id = %session_id,
        error.type = tracing::field::Empty,
        rpc.jsonrpc.error_code = tracing::field::Empty,
        rpc.jsonrpc.error_message = tracing::field::Empty,
    );

    async {
        let result = dispatch_inner(state, session_id, message).await;

        if let Err(ref error) = result {
            let span = tracing::Span::current();
            span.record("error.type", error.kind());
            span.record("rpc.jsonrpc.error_code", error.code);
            span.record("rpc.jsonrpc.error_message", error.message.as_str());
        }

        result
    }
    .instrument(span)
    .await
}

async fn dispatch_inner<H: Handler>(
    state: &Arc<McpState<H>>,
    session_id: &str,
    message: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    match message.method.as_str() {
        // Lifecycle
        "initialize" => handle_initialize(state, session_id, message),
        "notifications/initialized" | "notifications/cancelled" => Ok(Value::Null),
        "ping" => Ok(serde_json::json!({})),

        // Tools
        "tools/list" => to_value(&ListToolsResult::all(state.handler.tools())),
        "tools/call" => handle_call_tool(state, message).await,

        // Prompts
        "prompts/list" => to_value(&ListPromptsResult::all(state.handler.prompts())),
        "prompts/get" => handle_get_prompt(state, message).await,

        _ => Err(ErrorData::method_not_found(&message.method)),
    }
}

fn to_value<T: serde::Serialize>(result: &T) -> Result<Value, ErrorData> {
    serde_json::to_value(result)
        .map_err(|e| ErrorData::internal_error(format!("Failed to serialize result: {}", e)))
}

fn handle_initialize<H: Handler>(
    state: &Arc<McpState<H>>,
    session_id: &str,
    message: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    let params: InitializeParams = message.parse_params("initialize")?;

    state.sessions.set_initialized(session_id, params.client_info);

    let mut result = InitializeResult::new(
        Implementation::new(&state.server_name, &state.server_version),
        state.handler.capabilities(),
    );
    if let Some(instructions) = state.handler.instructions() {
        result = result.with_instructions(instructions);
    }

    to_value(&result)
}

async fn handle_call_tool<H: Handler>(
    state: &Arc<McpState<H>>,
    message: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    let params: CallToolParams = message.parse_params("call")?;

    let arguments = Value::Object(params.arguments.unwrap_or_default());

    let tool_span = tracing::info_span!("mcp.tool.call", mcp.tool.name = %params.name);

    async {
        let result = state.handler.call_tool(&params.name, arguments).await?;
        if result.is_error {
            tracing::warn!(
                tool = %params.name,
                error = result.first_text().unwrap_or_default(),
                "Tool call failed"
            );
        }
        to_value(&result)
    }
    .instrument(tool_span)
    .await
}

async fn handle_get_prompt<H: Handler>(
    state: &Arc<McpState<H>>,
    message: &JsonRpcMessage,
) -> Result<Value, ErrorData> {
    #[derive(Deserialize)]
    struct Params {
        name: String,
        #[serde(default)]
        arguments: Option<HashMap<String, String>>,
    }

    let params: Params = message.parse_params("get")?;

    let prompt_span = tracing::info_span!("mcp.prompt.get", mcp.prompt.name = %params.name);

    async {
        let arguments = params.arguments.unwrap_or_default();
        let result = state.handler.get_prompt(&params.name, arguments).await?;
        to_value(&result)
    }
    .instrument(prompt_span)
    .await
}
