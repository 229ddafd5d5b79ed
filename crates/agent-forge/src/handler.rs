use std::collections::HashMap;
use std::sync::Arc;

use anvil::{
    schema_for, CallToolResult, ErrorData, GetPromptResult, Handler, Implementation, Prompt, Tool,
};
use async_trait::async_trait;
use forgeconf::ForgeConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::answer::{self, Rounds};
use crate::error::{ForgeError, Result};
use crate::llm::LlmGateway;
use crate::prompts;
use crate::registry::AgentRegistry;
use crate::types::*;

const INSTRUCTIONS: &str = "agent-forge creates expert personas and lets them answer in character. \
Use create_agent to generate a persona from a name and core traits, then agent_answer to have it \
respond to a discussion context. get_agent, list_agents, update_agent and delete_agent manage the \
registry, which lives only as long as the server process. The discussion_protocol prompt describes \
how to moderate a multi-round roundtable.";

pub struct ForgeHandler {
    registry: Arc<AgentRegistry>,
}

impl ForgeHandler {
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self { registry }
    }

    /// Build the gateway and an empty registry from config.
    pub fn from_config(config: &ForgeConfig) -> Result<Self> {
        let gateway = LlmGateway::from_config(&config.deepseek)?;
        Ok(Self::new(Arc::new(AgentRegistry::new(gateway))))
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    async fn create_agent(&self, args: Value) -> Result<Value> {
        let request: CreateAgentRequest = parse_args(args)?;
        let agent_id = self
            .registry
            .create(&request.agent_name, &request.core_traits)
            .await?;

        Ok(json!({
            "status": "success",
            "message": "Agent created",
            "agent_id": agent_id,
        }))
    }

    async fn get_agent(&self, args: Value) -> Result<Value> {
        let request: AgentIdRequest = parse_args(args)?;
        encode(&self.registry.get(&request.agent_id).await?)
    }

    async fn list_agents(&self) -> Result<Value> {
        encode(&self.registry.list().await)
    }

    async fn delete_agent(&self, args: Value) -> Result<Value> {
        let request: AgentIdRequest = parse_args(args)?;
        self.registry.delete(&request.agent_id).await?;

        Ok(json!({
            "status": "success",
            "message": format!("Agent {} deleted", request.agent_id),
        }))
    }

    async fn update_agent(&self, args: Value) -> Result<Value> {
        let request: UpdateAgentRequest = parse_args(args)?;
        let agent = self
            .registry
            .update(
                &request.agent_id,
                request.name.as_deref(),
                request.core_traits.as_deref(),
            )
            .await?;

        Ok(json!({
            "status": "success",
            "message": "Agent updated",
            "agent": encode(&agent)?,
        }))
    }

    async fn agent_answer(&self, args: Value) -> Result<Value> {
        let request: AgentAnswerRequest = parse_args(args)?;
        let rounds = Rounds {
            planned: request.planned_rounds.unwrap_or_default(),
            current: request.current_round.unwrap_or_default(),
            need_more: request.need_more_rounds.unwrap_or_default(),
        };

        let response = answer::answer(
            &self.registry,
            &request.agent_id,
            request.context.as_deref().unwrap_or_default(),
            rounds,
        )
        .await?;

        encode(&response)
    }
}

fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T> {
    serde_json::from_value(args).map_err(|e| ForgeError::Validation(e.to_string()))
}

fn encode<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| ForgeError::Upstream(format!("failed to encode result: {}", e)))
}

/// Domain errors become `isError` results rather than JSON-RPC errors.
fn into_tool_result(tool: &str, outcome: Result<Value>) -> CallToolResult {
    let text = outcome.and_then(|value| {
        serde_json::to_string(&value)
            .map_err(|e| ForgeError::Upstream(format!("failed to encode result: {}", e)))
    });

    match text {
        Ok(text) => CallToolResult::text(text),
        Err(e) => {
            tracing::debug!(tool, error.kind = e.kind(), "Tool returned a domain error");
            CallToolResult::error(e.to_string())
        }
    }
}

#[async_trait]
impl Handler for ForgeHandler {
    fn tools(&self) -> Vec<Tool> {
        vec![
            Tool::new(
                "create_agent",
                "Create an expert agent. Generates its personality from the name and core traits.",
            )
            .with_title("Create Agent")
            .with_input_schema(schema_for::<CreateAgentRequest>())
            .open_world(),
            Tool::new("get_agent", "Get an agent by id")
                .with_title("Get Agent")
                .with_input_schema(schema_for::<AgentIdRequest>())
                .read_only(),
            Tool::new("list_agents", "List all agents")
                .with_title("List Agents")
                .read_only(),
            Tool::new("delete_agent", "Delete an agent by id")
                .with_title("Delete Agent")
                .with_input_schema(schema_for::<AgentIdRequest>())
                .destructive(),
            Tool::new(
                "update_agent",
                "Rename an agent and/or change its core traits. New traits regenerate the personality.",
            )
            .with_title("Update Agent")
            .with_input_schema(schema_for::<UpdateAgentRequest>())
            .open_world(),
            Tool::new(
                "agent_answer",
                "Have an agent answer in character.\n\
                 - agent_id: id returned by create_agent\n\
                 - context: the discussion so far: the user's question and clarifications, \
                 other experts' views, this agent's earlier points, outside knowledge\n\
                 - planned_rounds: rounds this agent is expected to answer\n\
                 - current_round: rounds answered so far\n\
                 - need_more_rounds: true when the moderator wants rounds beyond the plan",
            )
            .with_title("Agent Answer")
            .with_input_schema(schema_for::<AgentAnswerRequest>())
            .open_world(),
        ]
    }

    async fn call_tool(&self, name: &str, args: Value) -> std::result::Result<CallToolResult, ErrorData> {
        let outcome = match name {
            "create_agent" => self.create_agent(args).await,
            "get_agent" => self.get_agent(args).await,
            "list_agents" => self.list_agents().await,
            "delete_agent" => self.delete_agent(args).await,
            "update_agent" => self.update_agent(args).await,
            "agent_answer" => self.agent_answer(args).await,
            _ => return Err(ErrorData::tool_not_found(name)),
        };

        Ok(into_tool_result(name, outcome))
    }

    fn server_info(&self) -> Implementation {
        Implementation::new("agent-forge", env!("CARGO_PKG_VERSION")).with_title("Agent Forge")
    }

    fn prompts(&self) -> Vec<Prompt> {
        prompts::list()
    }

    async fn get_prompt(
        &self,
        name: &str,
        arguments: HashMap<String, String>,
    ) -> std::result::Result<GetPromptResult, ErrorData> {
        prompts::render(name, &arguments)
    }

    fn instructions(&self) -> Option<String> {
        Some(INSTRUCTIONS.to_string())
    }
}
