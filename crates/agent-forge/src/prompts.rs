//! Prompt templates
//!
//! Pure string formatting: nothing here touches the registry or the gateway.

use std::collections::HashMap;

use anvil::{ErrorData, GetPromptResult, Prompt, PromptMessage};

pub const EXPERT_PERSONA: &str = "expert_persona";
pub const DISCUSSION_PROTOCOL: &str = "discussion_protocol";

const DEFAULT_ROUNDS: &str = "3";

pub fn list() -> Vec<Prompt> {
    vec![
        Prompt::new(EXPERT_PERSONA)
            .with_title("Expert persona")
            .with_description("Design an expert persona and register it with create_agent")
            .argument("agent_name", "Name of the expert to create", true)
            .argument("core_traits", "Core traits the persona must embody", true),
        Prompt::new(DISCUSSION_PROTOCOL)
            .with_title("Roundtable discussion")
            .with_description("Moderate a multi-round expert discussion using agent_answer")
            .argument("topic", "Question or topic under discussion", true)
            .argument("experts", "Comma-separated agent ids or names to invite", false)
            .argument("rounds", "Planned rounds per expert (default 3)", false),
    ]
}

/// Render `name` with `arguments`.
///
/// Unknown prompts and missing required arguments are `-32602`.
pub fn render(name: &str, arguments: &HashMap<String, String>) -> Result<GetPromptResult, ErrorData> {
    let prompt = list()
        .into_iter()
        .find(|p| p.name == name)
        .ok_or_else(|| ErrorData::prompt_not_found(name))?;

    for required in prompt.required_arguments() {
        if arguments.get(required).is_none_or(|v| v.is_empty()) {
            return Err(ErrorData::invalid_params(format!(
                "Missing required argument '{}' for prompt '{}'",
                required, name
            )));
        }
    }

    let arg = |key: &str| arguments.get(key).map(String::as_str).unwrap_or_default();

    match name {
        EXPERT_PERSONA => Ok(expert_persona(arg("agent_name"), arg("core_traits"))),
        DISCUSSION_PROTOCOL => {
            let rounds = Some(arg("rounds")).filter(|r| !r.trim().is_empty()).unwrap_or(DEFAULT_ROUNDS);
            Ok(discussion_protocol(arg("topic"), arg("experts"), rounds))
        }
        _ => Err(ErrorData::prompt_not_found(name)),
    }
}

fn expert_persona(agent_name: &str, core_traits: &str) -> GetPromptResult {
    let brief = format!(
        "I need an expert persona named \"{agent_name}\" whose core traits are: {core_traits}.\n\
         \n\
         Before creating it, work out:\n\
         1. The field this expert works in and the depth of their experience.\n\
         2. How the traits show up in the way they reason and speak.\n\
         3. The blind spots or biases that make them a distinct voice in a discussion."
    );

    let plan = "I'll sketch the persona first, then register it so it can take part in \
                discussions."
        .to_string();

    let action = format!(
        "Now call the `create_agent` tool with agent_name=\"{agent_name}\" and \
         core_traits=\"{core_traits}\". Report the returned agent_id, and use `get_agent` \
         if you want to review the generated personality."
    );

    GetPromptResult::new(vec![
        PromptMessage::user_text(brief),
        PromptMessage::assistant_text(plan),
        PromptMessage::user_text(action),
    ])
    .with_description(format!("Create the expert persona {}", agent_name))
}

fn discussion_protocol(topic: &str, experts: &str, rounds: &str) -> GetPromptResult {
    let panel = if experts.trim().is_empty() {
        "Pick the experts from `list_agents`, or create new ones with `create_agent` when the \
         panel is missing a perspective."
            .to_string()
    } else {
        format!("The panel is: {experts}. Resolve each to an agent_id with `list_agents`.")
    };

    let protocol = format!(
        "You are the moderator of a roundtable discussion.\n\
         \n\
         Topic: {topic}\n\
         \n\
         {panel}\n\
         \n\
         Protocol:\n\
         1. Plan {rounds} round(s) per expert. Track planned_rounds and current_round for each \
         expert yourself; agent_answer does not remember them.\n\
         2. Each round, call `agent_answer` once per expert. Pass the full discussion so far as \
         `context`: the original question, the other experts' views, this expert's earlier \
         points, and any outside knowledge you gathered.\n\
         3. Increase current_round after every answer. If the debate is still productive when an \
         expert reaches the plan, set need_more_rounds=true and raise planned_rounds.\n\
         4. Stop when every expert has reached planned_rounds and nobody needs more rounds.\n\
         5. Close with a summary: points of agreement, open disagreements, and a recommendation."
    );

    GetPromptResult::new(vec![
        PromptMessage::user_text(protocol),
        PromptMessage::assistant_text(format!(
            "Understood. I'll moderate the discussion on \"{topic}\" for {rounds} planned round(s) \
             and summarize at the end."
        )),
    ])
    .with_description(format!("Roundtable protocol for: {}", topic))
}
