//! Domain errors surfaced to MCP clients as failed tool results.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForgeError {
    /// A required argument was missing, empty, or of the wrong shape.
    #[error("invalid argument: {0}")]
    Validation(String),

    #[error("agent not found: {0}")]
    NotFound(String),

    /// The chat-completion call failed or returned nothing usable.
    #[error("upstream API error: {0}")]
    Upstream(String),
}

impl ForgeError {
    pub fn kind(&self) -> &'static str {
        match self {
            ForgeError::Validation(_) => "validation",
            ForgeError::NotFound(_) => "not_found",
            ForgeError::Upstream(_) => "upstream",
        }
    }
}

pub type Result<T> = std::result::Result<T, ForgeError>;
