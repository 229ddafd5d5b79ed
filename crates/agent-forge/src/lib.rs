//! agent-forge - expert personas over MCP
//!
//! Generates persona prompts for named experts through an OpenAI-compatible
//! chat API (DeepSeek by default), keeps them in an in-memory registry, and
//! lets MCP clients have them answer discussion questions in character.
//!
//! - [`llm`] - chat-completion gateway and reply post-processing
//! - [`registry`] - agent CRUD
//! - [`answer`] - role-play answers with round bookkeeping
//! - [`prompts`] - `expert_persona` and `discussion_protocol` templates
//! - [`handler`] - the MCP tool/prompt dispatch table
//! - [`serve`] - stdio and Streamable HTTP entry points
//! - [`telemetry`] - tracing subscriber and rotating log file

pub mod answer;
pub mod error;
pub mod handler;
pub mod llm;
pub mod prompts;
pub mod registry;
pub mod serve;
pub mod telemetry;
pub mod types;

#[cfg(test)]
mod testing;

pub use answer::{AnswerResponse, Rounds};
pub use error::{ForgeError, Result};
pub use handler::ForgeHandler;
pub use llm::{ChatBackend, ChatMessage, ChatRole, LlmGateway, OpenAiBackend};
pub use registry::{Agent, AgentRegistry};
