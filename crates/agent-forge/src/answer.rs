//! Role-play answers
//!
//! Stateless with respect to rounds: the caller tracks progression and
//! passes the counters back in on every call.

use serde::{Deserialize, Serialize, Serializer};

use crate::error::Result;
use crate::registry::AgentRegistry;

/// One answer plus the round bookkeeping echoed back to the moderator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub content: String,
    #[serde(serialize_with = "whole_number")]
    pub planned_rounds: f64,
    #[serde(serialize_with = "whole_number")]
    pub current_round: f64,
    pub need_more_rounds: bool,
}

/// Largest f64 below which every integer is exact.
const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

/// Write `5.0` as `5`; fractional values stay floats.
fn whole_number<S: Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < EXACT_INTEGER_LIMIT {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Round counters as supplied by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rounds {
    pub planned: f64,
    pub current: f64,
    pub need_more: bool,
}

impl Rounds {
    /// Raise `planned` to `current` when the caller has overrun its plan.
    pub fn reconciled(self) -> Self {
        Self {
            planned: if self.current > self.planned {
                self.current
            } else {
                self.planned
            },
            ..self
        }
    }
}

fn role_play_prompt(name: &str, personality: &str) -> String {
    format!("You are now role-playing {}. {}", name, personality)
}

/// Have `agent_id` respond to `context` in character.
#[tracing::instrument(skip(registry, context), fields(round = rounds.current))]
pub async fn answer(
    registry: &AgentRegistry,
    agent_id: &str,
    context: &str,
    rounds: Rounds,
) -> Result<AnswerResponse> {
    let rounds = rounds.reconciled();
    let agent = registry.get(agent_id).await?;

    let content = registry
        .gateway()
        .complete(&role_play_prompt(&agent.name, &agent.personality), context, None)
        .await?;

    Ok(AnswerResponse {
        content,
        planned_rounds: rounds.planned,
        current_round: rounds.current,
        need_more_rounds: rounds.need_more,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForgeError;
    use crate::llm::{ChatMessage, LlmGateway};
    use crate::testing::ScriptedBackend;
    use std::sync::Arc;

    #[test]
    fn test_reconcile_raises_plan() {
        let rounds = Rounds {
            planned: 3.0,
            current: 5.0,
            need_more: false,
        }
        .reconciled();
        assert_eq!(rounds.planned, 5.0);
        assert_eq!(rounds.current, 5.0);
    }

    #[test]
    fn test_reconcile_keeps_plan() {
        let rounds = Rounds {
            planned: 4.0,
            current: 2.0,
            need_more: true,
        };
        assert_eq!(rounds.reconciled(), rounds);
    }

    #[tokio::test]
    async fn test_answer_in_character() {
        let backend = Arc::new(ScriptedBackend::replying("In my view, yes."));
        let registry = AgentRegistry::new(LlmGateway::new(backend.clone()));
        let id = registry.create("Economist", "pragmatic").await.unwrap();

        let response = answer(
            &registry,
            &id,
            "Should we raise rates?",
            Rounds {
                planned: 3.0,
                current: 5.0,
                need_more: true,
            },
        )
        .await
        .unwrap();

        assert_eq!(response.content, "In my view, yes.");
        assert_eq!(response.planned_rounds, 5.0);
        assert_eq!(response.current_round, 5.0);
        assert!(response.need_more_rounds);

        let calls = backend.calls();
        let last = calls.last().unwrap();
        assert_eq!(
            last,
            &vec![
                ChatMessage::system("You are now role-playing Economist. In my view, yes."),
                ChatMessage::user("Should we raise rates?"),
            ]
        );
    }

    #[test]
    fn test_whole_rounds_serialize_as_integers() {
        let response = AnswerResponse {
            content: "ok".to_string(),
            planned_rounds: 5.0,
            current_round: 2.5,
            need_more_rounds: false,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["planned_rounds"], serde_json::json!(5));
        assert!(json["planned_rounds"].is_i64());
        assert_eq!(json["current_round"], serde_json::json!(2.5));
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"content":"ok","planned_rounds":5,"current_round":2.5,"need_more_rounds":false}"#
        );

        let back: AnswerResponse = serde_json::from_value(json).unwrap();
        assert_eq!(back, response);
    }

    #[tokio::test]
    async fn test_answer_unknown_agent() {
        let backend = Arc::new(ScriptedBackend::replying("unused"));
        let registry = AgentRegistry::new(LlmGateway::new(backend.clone()));

        let err = answer(&registry, "nobody", "hi", Rounds::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ForgeError::NotFound(_)));
        assert!(backend.calls().is_empty());
    }
}
