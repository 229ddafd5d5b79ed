//! Content Types
//!
//! Content blocks returned from tool calls and embedded in prompt messages.

use serde::{Deserialize, Serialize};

/// Content block in a message or tool result.
///
/// Only text is produced by this server; the tag keeps the wire shape
/// compatible with clients that expect the full MCP content union.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    /// Text content.
    Text { text: String },
}

impl Content {
    /// Create text content.
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text { text: text.into() }
    }

    /// Get the text if this is text content.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text { text } => Some(text),
        }
    }
}
