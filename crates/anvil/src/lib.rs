//! anvil - a small MCP (Model Context Protocol) server library
//!
//! Implements the tool and prompt half of the MCP 2025-06-18
//! specification, with a stdio transport for desktop clients and a
//! Streamable HTTP transport built on axum.
//!
//! # Example
//!
//! ```rust,ignore
//! use anvil::{CallToolResult, ErrorData, Handler, Implementation, Tool};
//! use async_trait::async_trait;
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl Handler for Echo {
//!     fn tools(&self) -> Vec<Tool> {
//!         vec![Tool::new("echo", "Echo the arguments back")]
//!     }
//!
//!     async fn call_tool(&self, _name: &str, args: serde_json::Value)
//!         -> Result<CallToolResult, ErrorData>
//!     {
//!         Ok(CallToolResult::text(args.to_string()))
//!     }
//!
//!     fn server_info(&self) -> Implementation {
//!         Implementation::new("echo", "0.1.0")
//!     }
//! }
//!
//! let state = std::sync::Arc::new(anvil::McpState::new(Echo));
//! anvil::serve_stdio(state).await?;
//! ```

pub mod protocol;
pub mod schema;
pub mod session;
pub mod transport;
pub mod types;

pub use types::content::Content;
pub use types::error::ErrorData;
pub use types::jsonrpc::{JsonRpcMessage, JsonRpcReply, RequestId};
pub use types::prompt::{GetPromptResult, Prompt, PromptArgument, PromptMessage};
pub use types::protocol::{Implementation, ServerCapabilities};
pub use types::tool::{CallToolResult, Tool, ToolAnnotations, ToolSchema};
pub use types::Role;

pub use session::{spawn_cleanup_task, InMemorySessionStore, Session, SessionStore};

pub use protocol::{dispatch, Handler};

pub use transport::{serve_io, serve_stdio, streamable_router, McpState, TransportError};

pub use schema::schema_for;
