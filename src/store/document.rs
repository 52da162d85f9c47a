//! Document store abstraction
//!
//! Sessions and custom agents are stored as plain documents in per-user
//! collections. There is no schema enforcement beyond the serde shapes and no
//! concurrency control: the last writer for a given document wins.

use crate::error::{ChatmateError, Result};
use crate::models::{Agent, ChatSession};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

/// Collection holding chat session documents
pub const SESSIONS: &str = "sessions";
/// Collection holding custom agent documents
pub const AGENTS: &str = "agents";

/// Per-user CRUD over session and custom-agent documents
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All session documents owned by `user_id`, in no particular order
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<ChatSession>>;

    /// A single session document
    async fn get_session(&self, user_id: &str, session_id: &str) -> Result<Option<ChatSession>>;

    /// Create or replace a session document
    async fn put_session(&self, user_id: &str, session: &ChatSession) -> Result<()>;

    /// Remove a session document; removing a missing document is not an error
    async fn delete_session(&self, user_id: &str, session_id: &str) -> Result<()>;

    /// All custom agents authored by `user_id`
    async fn list_custom_agents(&self, user_id: &str) -> Result<Vec<Agent>>;

    /// Create or replace a custom agent document
    async fn put_custom_agent(&self, user_id: &str, agent: &Agent) -> Result<()>;

    /// Remove a custom agent document
    async fn delete_custom_agent(&self, user_id: &str, agent_id: &str) -> Result<()>;
}

type Collection = BTreeMap<String, serde_json::Value>;

/// In-process document store
///
/// Documents are kept as JSON values so that the same serialization path is
/// exercised as with the persistent backends.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    docs: RwLock<HashMap<(String, &'static str), Collection>>,
}

impl MemoryDocumentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn put(
        &self,
        user_id: &str,
        collection: &'static str,
        id: &str,
        value: serde_json::Value,
    ) -> Result<()> {
        let mut docs = self.docs.write().map_err(lock_poisoned)?;
        docs.entry((user_id.to_string(), collection))
            .or_default()
            .insert(id.to_string(), value);
        Ok(())
    }

    fn remove(&self, user_id: &str, collection: &'static str, id: &str) -> Result<()> {
        let mut docs = self.docs.write().map_err(lock_poisoned)?;
        if let Some(c) = docs.get_mut(&(user_id.to_string(), collection)) {
            c.remove(id);
        }
        Ok(())
    }

    fn get(
        &self,
        user_id: &str,
        collection: &'static str,
        id: &str,
    ) -> Result<Option<serde_json::Value>> {
        let docs = self.docs.read().map_err(lock_poisoned)?;
        Ok(docs
            .get(&(user_id.to_string(), collection))
            .and_then(|c| c.get(id).cloned()))
    }

    fn values(&self, user_id: &str, collection: &'static str) -> Result<Vec<serde_json::Value>> {
        let docs = self.docs.read().map_err(lock_poisoned)?;
        Ok(docs
            .get(&(user_id.to_string(), collection))
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default())
    }
}

fn lock_poisoned<T>(_: PoisonError<T>) -> ChatmateError {
    ChatmateError::Storage("in-memory document store lock poisoned".to_string())
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<ChatSession>> {
        self.values(user_id, SESSIONS)?
            .into_iter()
            .map(|v| serde_json::from_value(v).map_err(Into::into))
            .collect()
    }

    async fn get_session(&self, user_id: &str, session_id: &str) -> Result<Option<ChatSession>> {
        match self.get(user_id, SESSIONS, session_id)? {
            Some(v) => Ok(Some(serde_json::from_value(v)?)),
            None => Ok(None),
        }
    }

    async fn put_session(&self, user_id: &str, session: &ChatSession) -> Result<()> {
        self.put(user_id, SESSIONS, &session.id, serde_json::to_value(session)?)
    }

    async fn delete_session(&self, user_id: &str, session_id: &str) -> Result<()> {
        self.remove(user_id, SESSIONS, session_id)
    }

    async fn list_custom_agents(&self, user_id: &str) -> Result<Vec<Agent>> {
        self.values(user_id, AGENTS)?
            .into_iter()
            .map(|v| serde_json::from_value(v).map_err(Into::into))
            .collect()
    }

    async fn put_custom_agent(&self, user_id: &str, agent: &Agent) -> Result<()> {
        self.put(user_id, AGENTS, &agent.id, serde_json::to_value(agent)?)
    }

    async fn delete_custom_agent(&self, user_id: &str, agent_id: &str) -> Result<()> {
        self.remove(user_id, AGENTS, agent_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::predefined_agents;

    #[tokio::test]
    async fn test_memory_store_is_scoped_per_user() {
        let store = MemoryDocumentStore::new();
        let session = ChatSession::new(&predefined_agents()[0]);
        store.put_session("alice", &session).await.unwrap();

        assert_eq!(store.list_sessions("alice").await.unwrap().len(), 1);
        assert!(store.list_sessions("bob").await.unwrap().is_empty());
        assert!(store
            .get_session("bob", &session.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_memory_store_put_replaces() {
        let store = MemoryDocumentStore::new();
        let mut session = ChatSession::new(&predefined_agents()[0]);
        store.put_session("u", &session).await.unwrap();
        session.agent_name = "Renamed".to_string();
        store.put_session("u", &session).await.unwrap();

        let sessions = store.list_sessions("u").await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].agent_name, "Renamed");
    }

    #[tokio::test]
    async fn test_memory_store_delete_missing_is_ok() {
        let store = MemoryDocumentStore::new();
        store.delete_session("u", "nope").await.unwrap();
        store.delete_custom_agent("u", "nope").await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_store_poisoned_lock_is_storage_error() {
        let store = std::sync::Arc::new(MemoryDocumentStore::new());
        let holder = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.docs.write().unwrap();
            panic!("writer died while holding the lock");
        })
        .join();

        let session = ChatSession::new(&predefined_agents()[0]);
        let err = store.put_session("u", &session).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChatmateError>(),
            Some(ChatmateError::Storage(_))
        ));
        assert!(store.list_sessions("u").await.is_err());
        assert!(store.delete_custom_agent("u", "x").await.is_err());
    }
}
