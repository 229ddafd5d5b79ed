//! Integration tests for the stdio transport.
//!
//! Drives `serve_io` over in-memory pipes with a small handler.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anvil::{
    CallToolResult, ErrorData, GetPromptResult, Handler, Implementation, McpState, Prompt,
    PromptMessage, Tool,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

struct Workbench;

#[async_trait]
impl Handler for Workbench {
    fn tools(&self) -> Vec<Tool> {
        vec![
            Tool::new("shout", "Uppercase the text argument"),
            Tool::new("stall", "Never finishes on its own"),
        ]
    }

    async fn call_tool(&self, name: &str, args: Value) -> Result<CallToolResult, ErrorData> {
        match name {
            "shout" => {
                let text = args["text"].as_str().unwrap_or_default();
                Ok(CallToolResult::text(text.to_uppercase()))
            }
            "stall" => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(CallToolResult::text("woke up"))
            }
            other => Err(ErrorData::tool_not_found(other)),
        }
    }

    fn server_info(&self) -> Implementation {
        Implementation::new("workbench", "0.0.1")
    }

    fn prompts(&self) -> Vec<Prompt> {
        vec![Prompt::new("greet").argument("who", "Who to greet", true)]
    }

    async fn get_prompt(
        &self,
        name: &str,
        arguments: HashMap<String, String>,
    ) -> Result<GetPromptResult, ErrorData> {
        if name != "greet" {
            return Err(ErrorData::prompt_not_found(name));
        }
        let who = arguments
            .get("who")
            .ok_or_else(|| ErrorData::invalid_params("Missing argument: who"))?;
        Ok(GetPromptResult::new(vec![PromptMessage::user_text(format!("Hello, {who}"))]))
    }

    fn instructions(&self) -> Option<String> {
        Some("Test bench".to_string())
    }
}

/// Feed `lines` to a fresh server, close stdin, and collect every reply.
async fn run_session(lines: &[Value]) -> Vec<Value> {
    let state = Arc::new(McpState::new(Workbench));
    let (mut client_in, server_in) = tokio::io::duplex(64 * 1024);
    let (server_out, mut client_out) = tokio::io::duplex(64 * 1024);

    let server = tokio::spawn(anvil::serve_io(state, server_in, server_out));

    for line in lines {
        let mut bytes = serde_json::to_vec(line).unwrap();
        bytes.push(b'\n');
        client_in.write_all(&bytes).await.unwrap();
    }
    drop(client_in);

    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not stop after EOF")
        .unwrap()
        .unwrap();

    let mut output = String::new();
    client_out.read_to_string(&mut output).await.unwrap();
    output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn reply_for(replies: &[Value], id: i64) -> &Value {
    replies
        .iter()
        .find(|r| r["id"] == id)
        .unwrap_or_else(|| panic!("no reply for id {id}: {replies:?}"))
}

#[tokio::test]
async fn test_initialize_handshake() {
    let replies = run_session(&[
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {
            "protocolVersion": "2025-06-18",
            "capabilities": {},
            "clientInfo": {"name": "test", "version": "1.0"}
        }}),
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
    ])
    .await;

    assert_eq!(replies.len(), 1, "notifications must not be answered");
    let response = &replies[0];
    assert_eq!(response["jsonrpc"], "2.0");
    assert_eq!(response["id"], 1);
    assert_eq!(response["result"]["serverInfo"]["name"], "workbench");
    assert_eq!(response["result"]["protocolVersion"], "2025-06-18");
    assert!(response["result"]["capabilities"]["tools"].is_object());
    assert!(response["result"]["capabilities"]["prompts"].is_object());
    assert_eq!(response["result"]["instructions"], "Test bench");
}

#[tokio::test]
async fn test_tools_list_and_call() {
    let replies = run_session(&[
        json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}),
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call", "params": {
            "name": "shout", "arguments": {"text": "forge"}
        }}),
        json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call", "params": {
            "name": "missing", "arguments": {}
        }}),
    ])
    .await;

    let tools = reply_for(&replies, 1)["result"]["tools"].as_array().unwrap().clone();
    assert_eq!(tools.len(), 2);
    assert_eq!(tools[0]["name"], "shout");
    assert_eq!(tools[0]["inputSchema"]["type"], "object");

    let call = &reply_for(&replies, 2)["result"];
    assert_eq!(call["content"][0]["type"], "text");
    assert_eq!(call["content"][0]["text"], "FORGE");

    assert_eq!(reply_for(&replies, 3)["error"]["code"], -32601);
}

#[tokio::test]
async fn test_prompts_get() {
    let replies = run_session(&[
        json!({"jsonrpc": "2.0", "id": 1, "method": "prompts/get", "params": {
            "name": "greet", "arguments": {"who": "smith"}
        }}),
        json!({"jsonrpc": "2.0", "id": 2, "method": "prompts/get", "params": {"name": "greet"}}),
        json!({"jsonrpc": "2.0", "id": 3, "method": "prompts/get", "params": {"name": "nope"}}),
    ])
    .await;

    let messages = &reply_for(&replies, 1)["result"]["messages"];
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["content"]["text"], "Hello, smith");

    assert_eq!(reply_for(&replies, 2)["error"]["code"], -32602);
    assert_eq!(reply_for(&replies, 3)["error"]["code"], -32602);
}

#[tokio::test]
async fn test_unknown_method() {
    let replies = run_session(&[json!({"jsonrpc": "2.0", "id": 9, "method": "resources/list"})]).await;
    assert_eq!(reply_for(&replies, 9)["error"]["code"], -32601);
}

#[tokio::test]
async fn test_parse_error_keeps_serving() {
    let state = Arc::new(McpState::new(Workbench));
    let (mut client_in, server_in) = tokio::io::duplex(4096);
    let (server_out, mut client_out) = tokio::io::duplex(4096);
    let server = tokio::spawn(anvil::serve_io(state, server_in, server_out));

    client_in.write_all(b"{not json\n\n").await.unwrap();
    client_in
        .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":4,\"method\":\"ping\"}\n")
        .await
        .unwrap();
    drop(client_in);
    server.await.unwrap().unwrap();

    let mut output = String::new();
    client_out.read_to_string(&mut output).await.unwrap();
    let replies: Vec<Value> = output.lines().map(|l| serde_json::from_str(l).unwrap()).collect();

    assert_eq!(replies.len(), 2);
    let parse_error = replies.iter().find(|r| r["id"].is_null()).unwrap();
    assert_eq!(parse_error["error"]["code"], -32700);
    assert_eq!(reply_for(&replies, 4)["result"], json!({}));
}

#[tokio::test]
async fn test_cancelled_request_gets_no_reply() {
    let replies = run_session(&[
        json!({"jsonrpc": "2.0", "id": 7, "method": "tools/call", "params": {
            "name": "stall", "arguments": {}
        }}),
        json!({"jsonrpc": "2.0", "method": "notifications/cancelled", "params": {
            "requestId": 7, "reason": "user abort"
        }}),
        json!({"jsonrpc": "2.0", "id": 8, "method": "ping"}),
    ])
    .await;

    assert_eq!(replies.len(), 1, "cancelled request must stay silent: {replies:?}");
    assert_eq!(replies[0]["id"], 8);
}

#[tokio::test]
async fn test_duplicate_in_flight_id_is_rejected() {
    let replies = run_session(&[
        json!({"jsonrpc": "2.0", "id": 7, "method": "tools/call", "params": {
            "name": "stall", "arguments": {}
        }}),
        json!({"jsonrpc": "2.0", "id": 7, "method": "tools/call", "params": {
            "name": "stall", "arguments": {}
        }}),
        json!({"jsonrpc": "2.0", "method": "notifications/cancelled", "params": {
            "requestId": 7
        }}),
    ])
    .await;

    // The cancel reaches the first request, so the session ends at EOF.
    assert_eq!(replies.len(), 1, "{replies:?}");
    assert_eq!(replies[0]["id"], 7);
    assert_eq!(replies[0]["error"]["code"], -32600);
}

#[tokio::test]
async fn test_id_reused_after_cancel_stays_cancellable() {
    let stall = json!({"jsonrpc": "2.0", "id": 9, "method": "tools/call", "params": {
        "name": "stall", "arguments": {}
    }});
    let cancel = json!({"jsonrpc": "2.0", "method": "notifications/cancelled", "params": {
        "requestId": 9
    }});

    let replies = run_session(&[stall.clone(), cancel.clone(), stall, cancel]).await;

    assert!(replies.is_empty(), "{replies:?}");
}

#[tokio::test]
async fn test_invalid_request_echoes_id() {
    let replies = run_session(&[json!({"jsonrpc": "1.0", "id": 5, "method": "ping"})]).await;
    assert_eq!(reply_for(&replies, 5)["error"]["code"], -32600);
}
