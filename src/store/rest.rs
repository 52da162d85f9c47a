//! Remote document store over HTTP
//!
//! Collections are addressed as `{base}/users/{user_id}/{collection}` and
//! documents as `{base}/users/{user_id}/{collection}/{id}`. Listing returns a
//! JSON array of documents; `PUT` replaces a document; `DELETE` removes it.

use crate::error::{ChatmateError, Result};
use crate::models::{Agent, ChatSession};
use crate::store::document::{DocumentStore, AGENTS, SESSIONS};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// HTTP-backed document store
pub struct RestDocumentStore {
    client: Client,
    base: Url,
    id_token: Option<String>,
}

impl RestDocumentStore {
    /// Create a store rooted at `base_url`
    ///
    /// # Errors
    ///
    /// Returns error if the URL cannot be parsed or the HTTP client fails to
    /// initialize
    pub fn new(base_url: &str, id_token: Option<String>) -> Result<Self> {
        let mut base = Url::parse(base_url)
            .map_err(|e| ChatmateError::Config(format!("Invalid storage URL {}: {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(
                ChatmateError::Config(format!("Storage URL cannot be a base: {}", base_url)).into(),
            );
        }
        // Keep any base path when joining segments.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("chatmate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ChatmateError::Storage(format!("Failed to create HTTP client: {}", e)))?;

        tracing::debug!("Initialized REST document store at {}", base);

        Ok(Self {
            client,
            base,
            id_token,
        })
    }

    fn url(&self, user_id: &str, collection: &str, id: Option<&str>) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ChatmateError::Storage("Storage URL cannot be a base".into()))?;
            segments.pop_if_empty();
            segments.push("users").push(user_id).push(collection);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.id_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn list<T: DeserializeOwned>(&self, user_id: &str, collection: &str) -> Result<Vec<T>> {
        let url = self.url(user_id, collection, None)?;
        tracing::debug!("Listing documents: {}", url);

        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| ChatmateError::Storage(format!("Request failed: {}", e)))?;

        let response = check_status(response).await?;
        let docs = response
            .json::<Vec<T>>()
            .await
            .map_err(|e| ChatmateError::Storage(format!("Failed to parse documents: {}", e)))?;
        Ok(docs)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        user_id: &str,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>> {
        let url = self.url(user_id, collection, Some(id))?;
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| ChatmateError::Storage(format!("Request failed: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = check_status(response).await?;
        let doc = response
            .json::<T>()
            .await
            .map_err(|e| ChatmateError::Storage(format!("Failed to parse document: {}", e)))?;
        Ok(Some(doc))
    }

    async fn put<T: serde::Serialize + Sync>(
        &self,
        user_id: &str,
        collection: &str,
        id: &str,
        doc: &T,
    ) -> Result<()> {
        let url = self.url(user_id, collection, Some(id))?;
        tracing::debug!("Writing document: {}", url);

        let response = self
            .authorize(self.client.put(url).json(doc))
            .send()
            .await
            .map_err(|e| ChatmateError::Storage(format!("Request failed: {}", e)))?;
        check_status(response).await?;
        Ok(())
    }

    async fn delete(&self, user_id: &str, collection: &str, id: &str) -> Result<()> {
        let url = self.url(user_id, collection, Some(id))?;
        tracing::debug!("Deleting document: {}", url);

        let response = self
            .authorize(self.client.delete(url))
            .send()
            .await
            .map_err(|e| ChatmateError::Storage(format!("Request failed: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::error!("Document store returned error {}: {}", status, body);
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ChatmateError::Authentication(format!(
            "Document store rejected credentials ({})",
            status
        ))
        .into());
    }
    Err(ChatmateError::Storage(format!("Document store returned {}: {}", status, body)).into())
}

#[async_trait]
impl DocumentStore for RestDocumentStore {
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<ChatSession>> {
        self.list(user_id, SESSIONS).await
    }

    async fn get_session(&self, user_id: &str, session_id: &str) -> Result<Option<ChatSession>> {
        self.get(user_id, SESSIONS, session_id).await
    }

    async fn put_session(&self, user_id: &str, session: &ChatSession) -> Result<()> {
        self.put(user_id, SESSIONS, &session.id, session).await
    }

    async fn delete_session(&self, user_id: &str, session_id: &str) -> Result<()> {
        self.delete(user_id, SESSIONS, session_id).await
    }

    async fn list_custom_agents(&self, user_id: &str) -> Result<Vec<Agent>> {
        self.list(user_id, AGENTS).await
    }

    async fn put_custom_agent(&self, user_id: &str, agent: &Agent) -> Result<()> {
        self.put(user_id, AGENTS, &agent.id, agent).await
    }

    async fn delete_custom_agent(&self, user_id: &str, agent_id: &str) -> Result<()> {
        self.delete(user_id, AGENTS, agent_id).await
    }
}
