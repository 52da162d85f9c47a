//! Agent catalog
//!
//! Predefined agents ship with the binary; custom agents are authored by the
//! user through [`AgentDraft`] and persisted per user in the document store.

pub mod validation;

pub use validation::{AgentDraft, DESCRIPTION_LEN, NAME_LEN, SYSTEM_PROMPT_LEN};

use crate::error::ChatmateError;
use crate::models::{Agent, AgentCategory};

/// Minimum similarity for an unknown id to be offered as a suggestion
const SUGGESTION_THRESHOLD: f64 = 0.7;

struct Builtin {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    category: AgentCategory,
    icon: &'static str,
    system_prompt: &'static str,
}

const BUILTIN_AGENTS: &[Builtin] = &[
    Builtin {
        id: "assistant",
        name: "Assistant",
        description: "A friendly general-purpose helper for everyday questions.",
        category: AgentCategory::General,
        icon: "sparkles",
        system_prompt: "You are a friendly, concise assistant. Answer clearly, ask for \
                        clarification when a request is ambiguous, and say so when you do \
                        not know something.",
    },
    Builtin {
        id: "writer",
        name: "Writing Coach",
        description: "Improves drafts, fixes grammar and suggests clearer wording.",
        category: AgentCategory::Productivity,
        icon: "pencil",
        system_prompt: "You are an experienced editor. Improve the user's text for clarity, \
                        grammar and tone while keeping their voice. Explain notable changes \
                        briefly.",
    },
    Builtin {
        id: "planner",
        name: "Planner",
        description: "Breaks goals into steps, schedules and checklists.",
        category: AgentCategory::Productivity,
        icon: "calendar",
        system_prompt: "You help people plan. Turn goals into small, ordered, actionable \
                        steps with rough time estimates, and keep plans realistic.",
    },
    Builtin {
        id: "storyteller",
        name: "Storyteller",
        description: "Writes short stories, poems and creative prompts on request.",
        category: AgentCategory::Creative,
        icon: "book",
        system_prompt: "You are an imaginative storyteller. Write vivid, original prose and \
                        verse in the style the user asks for, keeping content suitable for \
                        a general audience.",
    },
    Builtin {
        id: "tutor",
        name: "Tutor",
        description: "Explains concepts step by step and checks understanding.",
        category: AgentCategory::Education,
        icon: "school",
        system_prompt: "You are a patient tutor. Explain concepts step by step with simple \
                        examples, then ask a short question to check understanding.",
    },
    Builtin {
        id: "fitness",
        name: "Fitness Guide",
        description: "Suggests workouts and healthy habits; not medical advice.",
        category: AgentCategory::Health,
        icon: "heart",
        system_prompt: "You are a supportive fitness and wellbeing guide. Suggest safe, \
                        general exercise and habit ideas and remind users to consult a \
                        professional for medical concerns.",
    },
    Builtin {
        id: "coder",
        name: "Code Helper",
        description: "Answers programming questions and reviews code snippets.",
        category: AgentCategory::Technology,
        icon: "code",
        system_prompt: "You are a senior software engineer. Give correct, idiomatic code \
                        with short explanations, and point out bugs or risks in code the \
                        user shares.",
    },
];

/// The agents bundled with the application
///
/// # Examples
///
/// ```
/// use chatmate::agents::predefined_agents;
///
/// let agents = predefined_agents();
/// assert!(agents.iter().any(|a| a.id == "assistant"));
/// assert!(agents.iter().all(|a| !a.is_custom));
/// ```
pub fn predefined_agents() -> Vec<Agent> {
    BUILTIN_AGENTS
        .iter()
        .map(|b| Agent {
            id: b.id.to_string(),
            name: b.name.to_string(),
            description: b.description.to_string(),
            category: b.category,
            icon: b.icon.to_string(),
            system_prompt: b.system_prompt.to_string(),
            is_custom: false,
            created_at: None,
        })
        .collect()
}

/// Look up an agent by id, producing an `UnknownAgent` error with the closest
/// known id as a suggestion when there is no exact match.
pub fn find_agent<'a>(agents: &'a [Agent], id: &str) -> Result<&'a Agent, ChatmateError> {
    agents
        .iter()
        .find(|a| a.id == id)
        .ok_or_else(|| ChatmateError::UnknownAgent {
            id: id.to_string(),
            suggestion: suggest_agent_id(agents, id),
        })
}

/// Closest agent id to `id` by normalized Levenshtein similarity
pub fn suggest_agent_id(agents: &[Agent], id: &str) -> Option<String> {
    agents
        .iter()
        .map(|a| (a, strsim::normalized_levenshtein(&a.id, id)))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(a, _)| a.id.clone())
}
