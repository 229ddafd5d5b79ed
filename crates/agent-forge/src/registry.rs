//! In-memory agent registry
//!
//! Agents live for the lifetime of the process. The map sits behind a tokio
//! `RwLock`; the lock is never held while the gateway is talking upstream.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{ForgeError, Result};
use crate::llm::LlmGateway;

const CREATE_SYSTEM_PROMPT: &str = "You are an expert persona generator. Given an agent name and its \
core traits, write the persona prompt for that expert. Return only the prompt text, nothing else.";

const UPDATE_SYSTEM_PROMPT: &str = "You are an expert persona generator. Given an agent name and its \
core traits, write a persona for that expert.";

/// An expert persona.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub core_traits: String,
    /// Generated persona text, used as the role-play system prompt.
    pub personality: String,
    /// RFC 3339, UTC, whole seconds.
    pub created_at: String,
}

fn persona_question(name: &str, core_traits: &str) -> String {
    format!(
        "Write a persona description for the agent named [{}] whose core traits are: [{}]",
        name, core_traits
    )
}

/// Treat empty strings as absent.
fn provided(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

pub struct AgentRegistry {
    agents: Arc<RwLock<HashMap<String, Agent>>>,
    gateway: LlmGateway,
}

impl AgentRegistry {
    pub fn new(gateway: LlmGateway) -> Self {
        Self {
            agents: Arc::new(RwLock::new(HashMap::new())),
            gateway,
        }
    }

    pub fn gateway(&self) -> &LlmGateway {
        &self.gateway
    }

    /// Generate a persona for `name` and store a new agent. Returns its id.
    #[tracing::instrument(skip(self, core_traits), fields(agent.id = tracing::field::Empty))]
    pub async fn create(&self, name: &str, core_traits: &str) -> Result<String> {
        if name.is_empty() {
            return Err(ForgeError::Validation("agent_name must not be empty".to_string()));
        }
        if core_traits.is_empty() {
            return Err(ForgeError::Validation("core_traits must not be empty".to_string()));
        }

        let personality = self
            .gateway
            .complete(CREATE_SYSTEM_PROMPT, &persona_question(name, core_traits), None)
            .await?;

        let agent = Agent {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            core_traits: core_traits.to_string(),
            personality,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        };
        let id = agent.id.clone();
        tracing::Span::current().record("agent.id", id.as_str());

        self.agents.write().await.insert(id.clone(), agent);
        tracing::info!("Agent created");

        Ok(id)
    }

    pub async fn get(&self, id: &str) -> Result<Agent> {
        self.agents
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(id.to_string()))
    }

    /// Every agent, in no particular order.
    pub async fn list(&self) -> Vec<Agent> {
        self.agents.read().await.values().cloned().collect()
    }

    /// Rename and/or re-trait an agent.
    ///
    /// New traits regenerate the personality under the effective name. The
    /// record changes only once generation has succeeded; if the agent was
    /// deleted in the meantime the update fails with `NotFound`.
    #[tracing::instrument(skip(self, name, core_traits))]
    pub async fn update(
        &self,
        id: &str,
        name: Option<&str>,
        core_traits: Option<&str>,
    ) -> Result<Agent> {
        let name = provided(name);
        let core_traits = provided(core_traits);

        let current = self.get(id).await?;

        let personality = match core_traits {
            Some(traits) => {
                let effective_name = name.unwrap_or(current.name.as_str());
                let personality = self
                    .gateway
                    .complete(UPDATE_SYSTEM_PROMPT, &persona_question(effective_name, traits), None)
                    .await?;
                Some(personality)
            }
            None => None,
        };

        let mut agents = self.agents.write().await;
        let agent = agents
            .get_mut(id)
            .ok_or_else(|| ForgeError::NotFound(id.to_string()))?;

        if let Some(name) = name {
            agent.name = name.to_string();
        }
        if let Some(traits) = core_traits {
            agent.core_traits = traits.to_string();
        }
        if let Some(personality) = personality {
            agent.personality = personality;
        }

        tracing::info!(regenerated = core_traits.is_some(), "Agent updated");
        Ok(agent.clone())
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        match self.agents.write().await.remove(id) {
            Some(_) => {
                tracing::info!(agent.id = %id, "Agent deleted");
                Ok(())
            }
            None => Err(ForgeError::NotFound(id.to_string())),
        }
    }

    pub async fn len(&self) -> usize {
        self.agents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.agents.read().await.is_empty()
    }
}
