//! Tool argument types. Schemas are generated from these for `tools/list`.

use anvil::schema::round_count_schema;
use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateAgentRequest {
    /// Display name of the expert, e.g. "Behavioral Economist"
    pub agent_name: String,

    /// Comma-separated core traits that shape the persona
    pub core_traits: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AgentIdRequest {
    /// Agent id returned by create_agent
    pub agent_id: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UpdateAgentRequest {
    /// Agent id returned by create_agent
    pub agent_id: String,

    /// New name; omit or leave empty to keep the current one
    #[serde(default)]
    pub name: Option<String>,

    /// New core traits; regenerates the personality when set
    #[serde(default)]
    pub core_traits: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AgentAnswerRequest {
    /// Agent id returned by create_agent
    pub agent_id: String,

    /// Discussion so far: the question, other experts' views, this agent's earlier points
    #[serde(default)]
    pub context: Option<String>,

    /// Rounds the moderator expects this agent to answer
    #[serde(default)]
    #[schemars(schema_with = "round_count_schema")]
    pub planned_rounds: Option<f64>,

    /// Rounds answered so far
    #[serde(default)]
    #[schemars(schema_with = "round_count_schema")]
    pub current_round: Option<f64>,

    /// Set when the moderator wants rounds beyond the plan
    #[serde(default)]
    pub need_more_rounds: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anvil::schema_for;

    #[test]
    fn test_create_schema_requires_both_fields() {
        let schema = schema_for::<CreateAgentRequest>();
        let mut required = schema.required.unwrap();
        required.sort();
        assert_eq!(required, vec!["agent_name", "core_traits"]);
    }

    #[test]
    fn test_answer_schema_only_requires_id() {
        let schema = schema_for::<AgentAnswerRequest>();
        assert_eq!(schema.required, Some(vec!["agent_id".to_string()]));

        let properties = schema.properties.unwrap();
        assert_eq!(properties["planned_rounds"]["type"], "number");
        assert!(properties.contains_key("need_more_rounds"));
    }

    #[test]
    fn test_answer_defaults() {
        let request: AgentAnswerRequest =
            serde_json::from_value(serde_json::json!({"agent_id": "a"})).unwrap();
        assert!(request.context.is_none());
        assert!(request.planned_rounds.is_none());
        assert!(request.need_more_rounds.is_none());
    }
}
