//! Session and message store
//!
//! [`ChatStore`] holds the chat sessions of one user, the currently active
//! session and the agent catalog. Local mutations are synchronous and
//! append-only; synchronization with the per-user document collection is a
//! single awaited call per operation with no retry and no concurrency token.

pub mod document;
pub mod rest;
pub mod sqlite;

pub use document::{DocumentStore, MemoryDocumentStore};
pub use rest::RestDocumentStore;
pub use sqlite::SqliteDocumentStore;

use crate::agents::{self, predefined_agents};
use crate::error::{ChatmateError, Result};
use crate::models::{Agent, ChatSession, Message};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Serializable copy of the store's local state
///
/// Written to the local cache so that the session list and the active
/// session survive restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatState {
    /// Sessions, most recently updated first
    pub sessions: Vec<ChatSession>,
    /// Id of the active session, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_session_id: Option<String>,
    /// Custom agents known at snapshot time
    #[serde(default)]
    pub custom_agents: Vec<Agent>,
}

/// Client-side state container for sessions, messages and agents
pub struct ChatStore {
    documents: Arc<dyn DocumentStore>,
    sessions: Vec<ChatSession>,
    active_session_id: Option<String>,
    agents: Vec<Agent>,
}

impl ChatStore {
    /// Create a store backed by `documents`, with only predefined agents
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self {
            documents,
            sessions: Vec::new(),
            active_session_id: None,
            agents: predefined_agents(),
        }
    }

    /// Start a new, empty session with `agent` and make it active
    ///
    /// The session is only written to the document store by
    /// [`save_active_session`](Self::save_active_session).
    pub fn create_session(&mut self, agent: &Agent) -> &ChatSession {
        let session = ChatSession::new(agent);
        tracing::debug!(session_id = %session.id, agent_id = %agent.id, "Created session");
        self.active_session_id = Some(session.id.clone());
        self.sessions.insert(0, session);
        &self.sessions[0]
    }

    /// Append `message` to the active session
    ///
    /// The session's `updated_at` becomes the message timestamp. A message
    /// stamped earlier than the current `updated_at` is re-stamped to it, so
    /// timestamps never go backwards. Returns `false` and does nothing when no
    /// session is active.
    pub fn add_message(&mut self, mut message: Message) -> bool {
        let Some(session) = self.active_session_mut() else {
            tracing::debug!("add_message ignored: no active session");
            return false;
        };

        if message.timestamp < session.updated_at {
            message.timestamp = session.updated_at;
        }
        session.updated_at = message.timestamp;
        session.messages.push(message);
        true
    }

    /// Replace local sessions with the user's remote sessions
    ///
    /// Sessions are sorted by `updated_at`, newest first. Any store failure is
    /// logged and leaves the session list empty; it is never returned to the
    /// caller. The active session is kept only if it is still present.
    pub async fn load_sessions(&mut self, user_id: &str) {
        match self.documents.list_sessions(user_id).await {
            Ok(mut sessions) => {
                sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
                tracing::debug!("Loaded {} sessions for {}", sessions.len(), user_id);
                self.sessions = sessions;
            }
            Err(e) => {
                tracing::error!("Failed to load sessions for {}: {:#}", user_id, e);
                self.sessions = Vec::new();
            }
        }

        if let Some(active) = &self.active_session_id {
            if !self.sessions.iter().any(|s| &s.id == active) {
                self.active_session_id = None;
            }
        }
    }

    /// Delete a session remotely, then locally
    ///
    /// Clears the active session if it is the one deleted.
    ///
    /// # Errors
    ///
    /// Returns the document store error; local state is left unchanged
    pub async fn delete_session(&mut self, session_id: &str, user_id: &str) -> Result<()> {
        self.documents.delete_session(user_id, session_id).await?;

        self.sessions.retain(|s| s.id != session_id);
        if self.active_session_id.as_deref() == Some(session_id) {
            self.active_session_id = None;
        }
        tracing::info!("Deleted session {}", session_id);
        Ok(())
    }

    /// Write the active session document
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` when no session is active, or the document
    /// store error
    pub async fn save_active_session(&self, user_id: &str) -> Result<()> {
        let session = self
            .active_session()
            .ok_or_else(|| ChatmateError::SessionNotFound("no active session".to_string()))?;
        self.documents.put_session(user_id, session).await
    }

    /// Rebuild the agent catalog from the predefined agents and `custom_agents`
    ///
    /// Custom agents whose id is already taken are dropped.
    pub fn load_agents(&mut self, custom_agents: Vec<Agent>) {
        let mut agents = predefined_agents();
        let mut ids: HashSet<String> = agents.iter().map(|a| a.id.clone()).collect();

        for agent in custom_agents {
            if ids.insert(agent.id.clone()) {
                agents.push(agent);
            } else {
                tracing::warn!("Ignoring custom agent with duplicate id {}", agent.id);
            }
        }

        self.agents = agents;
    }

    /// Add a custom agent to the in-memory catalog
    ///
    /// # Errors
    ///
    /// Returns `DuplicateAgent` if the id is already in the catalog
    pub fn add_custom_agent(&mut self, agent: Agent) -> std::result::Result<(), ChatmateError> {
        if self.agents.iter().any(|a| a.id == agent.id) {
            return Err(ChatmateError::DuplicateAgent(agent.id));
        }
        self.agents.push(agent);
        Ok(())
    }

    /// Load the user's custom agents from the document store into the catalog
    ///
    /// # Errors
    ///
    /// Returns the document store error; the catalog is left unchanged
    pub async fn sync_custom_agents(&mut self, user_id: &str) -> Result<()> {
        let custom = self.documents.list_custom_agents(user_id).await?;
        self.load_agents(custom);
        Ok(())
    }

    /// Add a custom agent to the catalog and write it to the document store
    ///
    /// # Errors
    ///
    /// Returns `DuplicateAgent` before anything is written, or the document
    /// store error, in which case the agent is removed from the catalog again
    pub async fn save_custom_agent(&mut self, user_id: &str, agent: Agent) -> Result<()> {
        let id = agent.id.clone();
        self.add_custom_agent(agent.clone())?;
        if let Err(e) = self.documents.put_custom_agent(user_id, &agent).await {
            self.agents.retain(|a| a.id != id);
            return Err(e);
        }
        tracing::info!("Saved custom agent {}", id);
        Ok(())
    }

    /// Delete a custom agent remotely, then from the catalog
    ///
    /// # Errors
    ///
    /// Returns `UnknownAgent` for unknown ids, `Validation` for predefined
    /// agents, or the document store error
    pub async fn delete_custom_agent(&mut self, user_id: &str, agent_id: &str) -> Result<()> {
        if !self.find_agent(agent_id)?.is_custom {
            return Err(ChatmateError::Validation(vec![crate::error::FieldError::new(
                "id",
                format!("'{}' is a built-in agent and cannot be deleted", agent_id),
            )])
            .into());
        }
        self.documents.delete_custom_agent(user_id, agent_id).await?;
        self.agents.retain(|a| a.id != agent_id);
        tracing::info!("Deleted custom agent {}", agent_id);
        Ok(())
    }

    /// All sessions, newest first after a load
    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    /// All agents, predefined first
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Only the user-authored agents
    pub fn custom_agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter().filter(|a| a.is_custom)
    }

    /// Look up an agent by id
    ///
    /// # Errors
    ///
    /// Returns `UnknownAgent` with the closest id as a suggestion
    pub fn find_agent(&self, id: &str) -> std::result::Result<&Agent, ChatmateError> {
        agents::find_agent(&self.agents, id)
    }

    /// The active session, if any
    pub fn active_session(&self) -> Option<&ChatSession> {
        let id = self.active_session_id.as_deref()?;
        self.sessions.iter().find(|s| s.id == id)
    }

    fn active_session_mut(&mut self) -> Option<&mut ChatSession> {
        let id = self.active_session_id.clone()?;
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    /// Make an existing session active
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` if no loaded session has that id
    pub fn set_active_session(&mut self, session_id: &str) -> std::result::Result<(), ChatmateError> {
        if !self.sessions.iter().any(|s| s.id == session_id) {
            return Err(ChatmateError::SessionNotFound(session_id.to_string()));
        }
        self.active_session_id = Some(session_id.to_string());
        Ok(())
    }

    /// Forget the active session without deleting it
    pub fn clear_active_session(&mut self) {
        self.active_session_id = None;
    }

    /// Resolve a full session id from a unique prefix of it
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` when nothing matches or the prefix is
    /// ambiguous
    pub fn resolve_session_id(&self, prefix: &str) -> std::result::Result<String, ChatmateError> {
        if prefix.is_empty() {
            return Err(ChatmateError::SessionNotFound(String::new()));
        }
        let mut matches = self.sessions.iter().filter(|s| s.id.starts_with(prefix));
        match (matches.next(), matches.next()) {
            (Some(s), None) => Ok(s.id.clone()),
            (Some(_), Some(_)) => Err(ChatmateError::SessionNotFound(format!(
                "{} (ambiguous prefix)",
                prefix
            ))),
            _ => Err(ChatmateError::SessionNotFound(prefix.to_string())),
        }
    }

    /// Copy of the local state for the persisted cache
    ///
    /// Sessions without messages are left out, and so is an active id that
    /// points at one.
    pub fn snapshot(&self) -> ChatState {
        let sessions: Vec<ChatSession> = self
            .sessions
            .iter()
            .filter(|s| !s.messages.is_empty())
            .cloned()
            .collect();
        let active_session_id = self
            .active_session_id
            .clone()
            .filter(|id| sessions.iter().any(|s| &s.id == id));
        ChatState {
            sessions,
            active_session_id,
            custom_agents: self.custom_agents().cloned().collect(),
        }
    }

    /// Replace local state with a previously taken snapshot
    pub fn restore(&mut self, state: ChatState) {
        self.sessions = state.sessions;
        self.active_session_id = state
            .active_session_id
            .filter(|id| self.sessions.iter().any(|s| &s.id == id));
        self.load_agents(state.custom_agents);
    }
}
