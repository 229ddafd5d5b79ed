//! MCP Protocol Types
//!
//! The subset of the MCP 2025-06-18 schema needed by a tool and prompt server:
//!
//! - `jsonrpc` - JSON-RPC 2.0 envelopes and request ids
//! - `error` - error data with the standard JSON-RPC codes
//! - `protocol` - initialize handshake and capability negotiation
//! - `tool` - tool definitions and call results
//! - `content` - content blocks carried by tool results and prompts
//! - `prompt` - prompt templates and messages

pub mod content;
pub mod error;
pub mod jsonrpc;
pub mod prompt;
pub mod protocol;
pub mod tool;

use serde::{Deserialize, Serialize};

/// Role in a conversation - user or assistant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}
