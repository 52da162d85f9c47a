use crate::error::{ChatmateError, Result};
use crate::models::{Agent, ChatSession};
use crate::store::document::{DocumentStore, AGENTS, SESSIONS};
use anyhow::Context;
use async_trait::async_trait;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// File-backed document store
///
/// Every document lives in one `documents` table keyed by
/// `(user_id, collection, id)` with its JSON body.
pub struct SqliteDocumentStore {
    db_path: PathBuf,
}

impl SqliteDocumentStore {
    /// Create a store in the user's data directory
    ///
    /// `CHATMATE_DB` overrides the location.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var("CHATMATE_DB") {
            return Self::new_with_path(override_path);
        }

        Self::new_with_path(default_db_path()?)
    }

    /// Create a store that uses the specified database path.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatmate::store::SqliteDocumentStore;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = SqliteDocumentStore::new_with_path(dir.path().join("chat.db")).unwrap();
    /// assert!(store.path().exists());
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for database")
                .map_err(|e| ChatmateError::Storage(e.to_string()))?;
        }

        let store = Self { db_path };
        store.init()?;
        Ok(store)
    }

    /// Location of the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| ChatmateError::Storage(e.to_string()).into())
    }

    fn init(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                user_id TEXT NOT NULL,
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body JSON NOT NULL,
                written_at TEXT NOT NULL,
                PRIMARY KEY (user_id, collection, id)
            )",
            [],
        )
        .context("Failed to create tables")
        .map_err(|e| ChatmateError::Storage(e.to_string()))?;

        Ok(())
    }

    fn put<T: serde::Serialize>(
        &self,
        user_id: &str,
        collection: &str,
        id: &str,
        doc: &T,
    ) -> Result<()> {
        let conn = self.open()?;
        let body = serde_json::to_string(doc)
            .context("Failed to serialize document")
            .map_err(|e| ChatmateError::Storage(e.to_string()))?;
        let now = chrono::Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO documents (user_id, collection, id, body, written_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (user_id, collection, id)
            DO UPDATE SET body = excluded.body, written_at = excluded.written_at",
            params![user_id, collection, id, body, now],
        )
        .context("Failed to write document")
        .map_err(|e| ChatmateError::Storage(e.to_string()))?;

        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, user_id: &str, collection: &str, id: &str) -> Result<Option<T>> {
        let conn = self.open()?;
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM documents WHERE user_id = ? AND collection = ? AND id = ?",
                params![user_id, collection, id],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to query document")
            .map_err(|e| ChatmateError::Storage(e.to_string()))?;

        match body {
            Some(body) => {
                let doc = serde_json::from_str(&body)
                    .context("Failed to deserialize document")
                    .map_err(|e| ChatmateError::Storage(e.to_string()))?;
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }

    fn list<T: DeserializeOwned>(&self, user_id: &str, collection: &str) -> Result<Vec<T>> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare("SELECT id, body FROM documents WHERE user_id = ? AND collection = ?")
            .context("Failed to prepare statement")
            .map_err(|e| ChatmateError::Storage(e.to_string()))?;

        let rows = stmt
            .query_map(params![user_id, collection], |row| {
                let id: String = row.get(0)?;
                let body: String = row.get(1)?;
                Ok((id, body))
            })
            .context("Failed to query documents")
            .map_err(|e| ChatmateError::Storage(e.to_string()))?;

        let mut docs = Vec::new();
        for (id, body) in rows.flatten() {
            match serde_json::from_str(&body) {
                Ok(doc) => docs.push(doc),
                Err(e) => {
                    tracing::warn!("Skipping unreadable {} document {}: {}", collection, id, e);
                }
            }
        }

        Ok(docs)
    }

    fn delete(&self, user_id: &str, collection: &str, id: &str) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "DELETE FROM documents WHERE user_id = ? AND collection = ? AND id = ?",
            params![user_id, collection, id],
        )
        .context("Failed to delete document")
        .map_err(|e| ChatmateError::Storage(e.to_string()))?;
        Ok(())
    }
}

/// Default database location in the platform data directory
pub fn default_db_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "chatmate", "chatmate")
        .ok_or_else(|| ChatmateError::Storage("Could not determine data directory".into()))?;
    Ok(proj_dirs.data_dir().join("chatmate.db"))
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<ChatSession>> {
        self.list(user_id, SESSIONS)
    }

    async fn get_session(&self, user_id: &str, session_id: &str) -> Result<Option<ChatSession>> {
        self.get(user_id, SESSIONS, session_id)
    }

    async fn put_session(&self, user_id: &str, session: &ChatSession) -> Result<()> {
        self.put(user_id, SESSIONS, &session.id, session)
    }

    async fn delete_session(&self, user_id: &str, session_id: &str) -> Result<()> {
        self.delete(user_id, SESSIONS, session_id)
    }

    async fn list_custom_agents(&self, user_id: &str) -> Result<Vec<Agent>> {
        self.list(user_id, AGENTS)
    }

    async fn put_custom_agent(&self, user_id: &str, agent: &Agent) -> Result<()> {
        self.put(user_id, AGENTS, &agent.id, agent)
    }

    async fn delete_custom_agent(&self, user_id: &str, agent_id: &str) -> Result<()> {
        self.delete(user_id, AGENTS, agent_id)
    }
}
