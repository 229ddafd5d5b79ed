//! Streamable HTTP Transport
//!
//! POST / carries one JSON-RPC message and receives the reply in the body.
//! Notifications get 202 with no body.

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use super::McpState;
use crate::types::error::ErrorData;
use crate::types::jsonrpc::{JsonRpcMessage, JsonRpcReply};
use crate::Handler;

pub const SESSION_HEADER: &str = "mcp-session-id";

/// Handle Streamable HTTP requests.
///
/// 1. Get or create session from Mcp-Session-Id header
/// 2. Parse JSON-RPC message (request or notification)
/// 3. Dispatch to the handler
/// 4. Return the reply with the session header (or 202 for notifications)
#[tracing::instrument(skip(state, headers, body), fields(session_id = tracing::field::Empty))]
pub async fn streamable_handler<H: Handler>(
    State(state): State<Arc<McpState<H>>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let session_hint = headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok());

    let session_id = state.sessions.get_or_create(session_hint);
    tracing::Span::current().record("session_id", session_id.as_str());
    state.sessions.touch(&session_id);

    let raw_id = body.get("id").cloned().unwrap_or(Value::Null);

    let message: JsonRpcMessage = match serde_json::from_value(body) {
        Ok(message) => message,
        Err(e) => {
            let reply = JsonRpcReply::error(
                raw_id,
                ErrorData::invalid_request(format!("Invalid JSON-RPC: {}", e)),
            );
            return with_session(StatusCode::BAD_REQUEST, &session_id, Json(reply).into_response());
        }
    };

    let Some(request_id) = message.id.clone() else {
        tracing::debug!(method = %message.method, "Notification received (streamable)");
        return with_session(StatusCode::ACCEPTED, &session_id, StatusCode::ACCEPTED.into_response());
    };

    tracing::info!(
        method = %message.method,
        request_id = %request_id,
        "Processing MCP request (streamable)"
    );

    let result = crate::protocol::dispatch(&state, &session_id, &message).await;
    let reply = JsonRpcReply::from_result(&request_id, result);

    with_session(StatusCode::OK, &session_id, Json(reply).into_response())
}

/// Set status and session header on a response.
fn with_session(status: StatusCode, session_id: &str, mut response: Response) -> Response {
    *response.status_mut() = status;

    if let Ok(header_value) = HeaderValue::from_str(session_id) {
        response.headers_mut().insert(SESSION_HEADER, header_value);
    }

    response
}

/// Handle DELETE requests (session termination).
#[tracing::instrument(skip(state, headers))]
pub async fn delete_handler<H: Handler>(
    State(state): State<Arc<McpState<H>>>,
    headers: HeaderMap,
) -> Response {
    let Some(session_id) = headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok()) else {
        return (StatusCode::BAD_REQUEST, "Missing Mcp-Session-Id header").into_response();
    };

    state.sessions.remove(session_id);
    tracing::info!(session_id = %session_id, "Session terminated");

    StatusCode::NO_CONTENT.into_response()
}
