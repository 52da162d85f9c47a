//! Core data types: agents, messages, chat sessions and users
//!
//! These are the shapes persisted to the document store and to the local
//! cache, so every type here round-trips through serde.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum number of characters used when deriving a session title
const TITLE_MAX_CHARS: usize = 40;

/// Category an agent is listed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentCategory {
    /// General purpose assistants
    #[default]
    General,
    /// Writing, planning and organisation
    Productivity,
    /// Stories, poems, brainstorming
    Creative,
    /// Tutoring and explanations
    Education,
    /// Fitness, nutrition, wellbeing
    Health,
    /// Programming and technical help
    Technology,
    /// User-authored agents
    Custom,
}

impl AgentCategory {
    /// All categories in display order
    pub const ALL: [AgentCategory; 7] = [
        Self::General,
        Self::Productivity,
        Self::Creative,
        Self::Education,
        Self::Health,
        Self::Technology,
        Self::Custom,
    ];

    /// Stable lowercase identifier, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Productivity => "productivity",
            Self::Creative => "creative",
            Self::Education => "education",
            Self::Health => "health",
            Self::Technology => "technology",
            Self::Custom => "custom",
        }
    }
}

impl std::fmt::Display for AgentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AgentCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown category '{}'; expected one of: {}",
                    s,
                    Self::ALL
                        .iter()
                        .map(|c| c.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}

/// A named system prompt presented to the user as a persona
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    /// Unique identifier across predefined and custom agents
    pub id: String,
    /// Display name
    pub name: String,
    /// One-line description shown in listings
    pub description: String,
    /// Listing category
    pub category: AgentCategory,
    /// Icon name or emoji
    pub icon: String,
    /// System instruction sent with every request
    pub system_prompt: String,
    /// Whether the agent was authored by the user
    #[serde(default)]
    pub is_custom: bool,
    /// Creation time, set for custom agents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human user
    User,
    /// The model
    Assistant,
}

impl Role {
    /// Lowercase role name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Reference to an image attached to a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    /// MIME type, e.g. `image/png`
    pub mime_type: String,
    /// Local file path the image was read from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Base64 payload when the image is stored inline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// One entry in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique identifier
    pub id: String,
    /// Author
    pub role: Role,
    /// Text content
    pub content: String,
    /// When the message was written
    pub timestamp: DateTime<Utc>,
    /// Optional attached image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
}

impl Message {
    /// Creates a user message stamped with the current time
    ///
    /// # Examples
    ///
    /// ```
    /// use chatmate::models::{Message, Role};
    ///
    /// let msg = Message::user("Hello!");
    /// assert_eq!(msg.role, Role::User);
    /// assert_eq!(msg.content, "Hello!");
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates an assistant message stamped with the current time
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            image: None,
        }
    }

    /// Attaches an image reference
    pub fn with_image(mut self, image: ImageRef) -> Self {
        self.image = Some(image);
        self
    }

    /// Overrides the timestamp
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// An ordered conversation between a user and one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    /// Unique identifier (v4 UUID)
    pub id: String,
    /// Agent the conversation is held with
    pub agent_id: String,
    /// Agent display name at the time the session was created
    pub agent_name: String,
    /// Messages in append order
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last appended message, or `created_at` when empty
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// Creates an empty session for `agent`, stamped with the current time
    pub fn new(agent: &Agent) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            agent_id: agent.id.clone(),
            agent_name: agent.name.clone(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The most recently appended message
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Short title derived from the first user message
    pub fn title(&self) -> String {
        let first = self
            .messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.trim());

        match first {
            Some(text) if !text.is_empty() => {
                let line = text.lines().next().unwrap_or(text);
                if line.chars().count() > TITLE_MAX_CHARS {
                    let cut: String = line.chars().take(TITLE_MAX_CHARS - 3).collect();
                    format!("{}...", cut)
                } else {
                    line.to_string()
                }
            }
            _ => format!("New chat with {}", self.agent_name),
        }
    }

    /// First 8 characters of the id, as shown in listings
    pub fn short_id(&self) -> &str {
        let end = self
            .id
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.id.len());
        &self.id[..end]
    }
}

/// Locally cached copy of the signed-in account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identity provider user id
    pub id: String,
    /// Email address
    pub email: String,
    /// Display name
    pub display_name: String,
    /// Optional avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent() -> Agent {
        Agent {
            id: "general".to_string(),
            name: "Assistant".to_string(),
            description: "General helper".to_string(),
            category: AgentCategory::General,
            icon: "sparkles".to_string(),
            system_prompt: "You are helpful.".to_string(),
            is_custom: false,
            created_at: None,
        }
    }

    #[test]
    fn test_new_session_is_empty_with_equal_timestamps() {
        let session = ChatSession::new(&agent());
        assert!(session.messages.is_empty());
        assert_eq!(session.created_at, session.updated_at);
        assert_eq!(session.agent_id, "general");
        assert_eq!(session.agent_name, "Assistant");
    }

    #[test]
    fn test_session_title_defaults_to_agent_name() {
        let session = ChatSession::new(&agent());
        assert_eq!(session.title(), "New chat with Assistant");
    }

    #[test]
    fn test_session_title_truncates_long_first_message() {
        let mut session = ChatSession::new(&agent());
        session.messages.push(Message::assistant("Hi there"));
        session.messages.push(Message::user("x".repeat(100)));
        let title = session.title();
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_short_id_is_eight_chars() {
        let session = ChatSession::new(&agent());
        assert_eq!(session.short_id().len(), 8);
        assert!(session.id.starts_with(session.short_id()));
    }

    #[test]
    fn test_category_from_str_is_case_insensitive() {
        assert_eq!(
            "Technology".parse::<AgentCategory>().unwrap(),
            AgentCategory::Technology
        );
        assert!("robots".parse::<AgentCategory>().is_err());
    }

    #[test]
    fn test_session_serializes_camel_case() {
        let mut session = ChatSession::new(&agent());
        session.messages.push(Message::user("hello"));
        let json = serde_json::to_value(&session).unwrap();
        assert!(json.get("agentId").is_some());
        assert!(json.get("updatedAt").is_some());
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_agent_custom_flag_defaults_false() {
        let json = r#"{
            "id": "a", "name": "A", "description": "d", "category": "creative",
            "icon": "i", "systemPrompt": "p"
        }"#;
        let agent: Agent = serde_json::from_str(json).unwrap();
        assert!(!agent.is_custom);
        assert!(agent.created_at.is_none());
        assert_eq!(agent.category, AgentCategory::Creative);
    }
}
