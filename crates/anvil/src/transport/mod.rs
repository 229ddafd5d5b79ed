//! MCP Transports
//!
//! ## stdio
//! Newline-delimited JSON-RPC on stdin/stdout. Requests run concurrently
//! and can be cancelled with `notifications/cancelled`.
//!
//! ## Streamable HTTP
//! - POST / - Send JSON-RPC request, receive response directly
//! - DELETE / - Terminate session
//! - Session ID via Mcp-Session-Id header

mod stdio;
mod streamable;

pub use stdio::{serve_io, serve_stdio, TransportError};
pub use streamable::{delete_handler, streamable_handler, SESSION_HEADER};

use axum::Router;
use std::sync::Arc;

use crate::session::{InMemorySessionStore, SessionStore};
use crate::Handler;

/// Shared state for MCP transports.
pub struct McpState<H> {
    /// The application's tool/prompt handler.
    pub handler: Arc<H>,

    pub sessions: Arc<dyn SessionStore>,

    /// Server name for protocol responses.
    pub server_name: String,

    /// Server version for protocol responses.
    pub server_version: String,
}

impl<H: Handler> McpState<H> {
    /// Create state for `handler`, taking name and version from its server info.
    pub fn new(handler: H) -> Self {
        Self::with_session_store(handler, Arc::new(InMemorySessionStore::new()))
    }

    /// Create state with a custom session store.
    pub fn with_session_store(handler: H, sessions: Arc<dyn SessionStore>) -> Self {
        let info = handler.server_info();
        Self {
            handler: Arc::new(handler),
            sessions,
            server_name: info.name,
            server_version: info.version,
        }
    }
}

/// Build an axum Router for MCP Streamable HTTP transport.
///
/// Routes:
/// - POST / - JSON-RPC request/response
/// - DELETE / - Session termination
pub fn streamable_router<H: Handler>(state: Arc<McpState<H>>) -> Router {
    Router::new()
        .route(
            "/",
            axum::routing::post(streamable_handler::<H>).delete(delete_handler::<H>),
        )
        .with_state(state)
}
