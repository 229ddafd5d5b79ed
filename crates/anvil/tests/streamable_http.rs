//! Integration tests for the Streamable HTTP transport.

use std::sync::Arc;

use anvil::{CallToolResult, ErrorData, Handler, Implementation, McpState, Tool};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

struct Echo;

#[async_trait]
impl Handler for Echo {
    fn tools(&self) -> Vec<Tool> {
        vec![Tool::new("echo", "Echo arguments back").read_only()]
    }

    async fn call_tool(&self, _name: &str, args: Value) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::text(args.to_string()))
    }

    fn server_info(&self) -> Implementation {
        Implementation::new("echo", "1.0.0")
    }
}

fn post(body: Value, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json");
    if let Some(session) = session {
        builder = builder.header(anvil::transport::SESSION_HEADER, session);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_post_assigns_session_and_replies() {
    let state = Arc::new(McpState::new(Echo));
    let app = anvil::streamable_router(Arc::clone(&state));

    let response = app
        .oneshot(post(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let session = response
        .headers()
        .get(anvil::transport::SESSION_HEADER)
        .expect("session header")
        .to_str()
        .unwrap()
        .to_string();
    assert!(state.sessions.get(&session).is_some());

    let body = json_body(response).await;
    assert_eq!(body["result"]["tools"][0]["name"], "echo");
    assert_eq!(body["result"]["tools"][0]["annotations"]["readOnlyHint"], true);
}

#[tokio::test]
async fn test_notification_is_accepted() {
    let state = Arc::new(McpState::new(Echo));
    let app = anvil::streamable_router(state);

    let response = app
        .oneshot(post(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_delete_terminates_session() {
    let state = Arc::new(McpState::new(Echo));
    let app = anvil::streamable_router(Arc::clone(&state));

    let response = app
        .clone()
        .oneshot(post(json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}), None))
        .await
        .unwrap();
    let session = response.headers()[anvil::transport::SESSION_HEADER]
        .to_str()
        .unwrap()
        .to_string();

    let delete = Request::builder()
        .method("DELETE")
        .uri("/")
        .header(anvil::transport::SESSION_HEADER, &session)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(delete).await.unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(state.sessions.get(&session).is_none());
}

#[tokio::test]
async fn test_malformed_message_is_bad_request() {
    let state = Arc::new(McpState::new(Echo));
    let app = anvil::streamable_router(state);

    let response = app
        .oneshot(post(json!({"jsonrpc": "2.0", "id": 3}), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["id"], 3);
    assert_eq!(body["error"]["code"], -32600);
}
