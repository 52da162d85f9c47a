/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint:

- `chat`: Interactive chat with an agent
- `ask`: One-shot prompt
- `sessions`: Session history
- `agents`: Agent catalog and custom agents
- `account`: Sign-in and API key management (the `auth` command)
- `theme`: Appearance settings

Handlers share an [`AppContext`] that wires config, the local cache and the
chat store together.
*/

use crate::auth::{self, AuthSession};
use crate::cache::{default_cache_path, LocalCache, CHAT_STATE_KEY};
use crate::config::{Config, StorageBackend};
use crate::error::{ChatmateError, Result};
use crate::store::{
    ChatState, ChatStore, DocumentStore, MemoryDocumentStore, RestDocumentStore,
    SqliteDocumentStore,
};
use colored::Colorize;
use std::sync::Arc;

pub mod agents;
pub mod ask;
pub mod chat;
pub mod sessions;
pub mod special_commands;
pub mod theme;

/// User id for documents written while signed out
pub const LOCAL_USER_ID: &str = "local";

/// Everything a command needs: config, cache, store and the current user
pub struct AppContext {
    pub config: Config,
    pub cache: LocalCache,
    pub store: ChatStore,
    /// Signed-in account, if any
    pub auth: Option<AuthSession>,
    /// Owner of the documents the store reads and writes
    pub user_id: String,
}

impl AppContext {
    /// Open the cache and the configured document store, then load agents
    ///
    /// Sessions are not loaded; commands that need them call
    /// [`load_sessions`](Self::load_sessions).
    ///
    /// # Errors
    ///
    /// Returns `NotSignedIn` for the `rest` backend without a cached session,
    /// or any error opening the cache or the database
    pub async fn open(config: Config) -> Result<Self> {
        let cache = open_cache(&config)?;
        let auth = auth::cached_session(&cache)?;
        if let Some(session) = &auth {
            if session.is_expired() {
                tracing::warn!("Cached sign-in for {} has expired", session.user.email);
            }
        }

        let documents = build_document_store(&config, auth.as_ref())?;
        let user_id = auth
            .as_ref()
            .map(|s| s.user.id.clone())
            .unwrap_or_else(|| LOCAL_USER_ID.to_string());

        let mut store = ChatStore::new(documents);
        if let Err(e) = store.sync_custom_agents(&user_id).await {
            tracing::warn!("Could not load custom agents: {:#}", e);
        }

        // The in-memory backend starts empty; its state lives in the snapshot.
        if config.storage.backend == StorageBackend::Memory {
            if let Some(state) = cache.get::<ChatState>(CHAT_STATE_KEY)? {
                store.restore(state);
            }
        }

        Ok(Self {
            config,
            cache,
            store,
            auth,
            user_id,
        })
    }

    /// Load the user's sessions
    ///
    /// A no-op for the in-memory backend, whose sessions were restored from
    /// the snapshot when the context was opened.
    pub async fn load_sessions(&mut self) -> Result<()> {
        if self.config.storage.backend != StorageBackend::Memory {
            self.store.load_sessions(&self.user_id).await;
        }
        Ok(())
    }

    /// Persist the store's local state to the cache
    pub fn persist_snapshot(&self) -> Result<()> {
        self.cache.set(CHAT_STATE_KEY, &self.store.snapshot())
    }
}

/// Open the local cache at the configured or default location
pub fn open_cache(config: &Config) -> Result<LocalCache> {
    let path = match &config.cache.path {
        Some(path) => path.clone(),
        None => default_cache_path()?,
    };
    tracing::debug!("Opening cache at {}", path.display());
    LocalCache::open(path)
}

/// Build the document store selected by `config.storage.backend`
pub fn build_document_store(
    config: &Config,
    auth: Option<&AuthSession>,
) -> Result<Arc<dyn DocumentStore>> {
    match config.storage.backend {
        StorageBackend::Sqlite => {
            let store = match &config.storage.path {
                Some(path) => SqliteDocumentStore::new_with_path(path)?,
                None => SqliteDocumentStore::new()?,
            };
            tracing::debug!("Using sqlite store at {}", store.path().display());
            Ok(Arc::new(store))
        }
        StorageBackend::Rest => {
            let session = auth.ok_or(ChatmateError::NotSignedIn)?;
            let url = config.storage.remote_url.as_deref().ok_or_else(|| {
                ChatmateError::Config("storage.remote_url is required for rest".to_string())
            })?;
            Ok(Arc::new(RestDocumentStore::new(
                url,
                Some(session.id_token.clone()),
            )?))
        }
        StorageBackend::Memory => Ok(Arc::new(MemoryDocumentStore::new())),
    }
}

/// Print an error the way commands report failures
///
/// Notices (safety blocks, rate limits, validation) are shown as warnings
/// rather than failures.
pub fn report_error(error: &anyhow::Error) {
    match error.downcast_ref::<ChatmateError>() {
        Some(e) if e.is_user_notice() => eprintln!("{}", e.to_string().yellow()),
        _ => eprintln!("{}", format!("Error: {:#}", error).red()),
    }
}

// Sign-in and credential handlers
pub mod account {
    use super::*;
    use crate::auth::{ApiKeyStore, HttpIdentityProvider, IdentityProvider};
    use crate::cli::AuthCommand;
    use rustyline::DefaultEditor;

    /// Handle `auth` subcommands
    pub async fn handle_auth(config: Config, command: AuthCommand) -> Result<()> {
        match command {
            AuthCommand::Login { email, password } => {
                let cache = open_cache(&config)?;
                let provider = HttpIdentityProvider::new(&config.identity)?;
                let password = password_or_prompt(password)?;
                let session = provider.sign_in(&email, &password).await?;
                auth::save_session(&cache, &session)?;
                println!(
                    "{}",
                    format!(
                        "Signed in as {} <{}>",
                        session.user.display_name, session.user.email
                    )
                    .green()
                );
            }
            AuthCommand::Signup {
                email,
                name,
                password,
            } => {
                let cache = open_cache(&config)?;
                let provider = HttpIdentityProvider::new(&config.identity)?;
                let password = password_or_prompt(password)?;
                let session = provider.sign_up(&email, &password, &name).await?;
                auth::save_session(&cache, &session)?;
                println!(
                    "{}",
                    format!("Account created. Welcome, {}!", session.user.display_name).green()
                );
            }
            AuthCommand::Logout => {
                let cache = open_cache(&config)?;
                match auth::cached_session(&cache)? {
                    Some(session) => {
                        if let Ok(provider) = HttpIdentityProvider::new(&config.identity) {
                            provider.sign_out(&session).await?;
                        }
                        auth::clear_session(&cache)?;
                        cache.remove(CHAT_STATE_KEY)?;
                        println!("{}", format!("Signed out {}", session.user.email).green());
                    }
                    None => println!("{}", "Not signed in.".yellow()),
                }
            }
            AuthCommand::Whoami => {
                let cache = open_cache(&config)?;
                match auth::cached_session(&cache)? {
                    Some(session) => {
                        println!("{} <{}>", session.user.display_name.bold(), session.user.email);
                        println!("User id: {}", session.user.id.cyan());
                        let expiry = session.expires_at.format("%Y-%m-%d %H:%M UTC");
                        if session.is_expired() {
                            println!("{}", format!("Token expired at {}", expiry).yellow());
                        } else {
                            println!("Token valid until {}", expiry);
                        }
                    }
                    None => println!("{}", "Not signed in.".yellow()),
                }
            }
            AuthCommand::SetApiKey { clear: true, .. } => {
                ApiKeyStore::default().clear()?;
                println!("{}", "API key removed from the system keyring.".green());
            }
            AuthCommand::SetApiKey { key, .. } => {
                let key = match key {
                    Some(key) => key,
                    None => DefaultEditor::new()?.readline("API key: ")?,
                };
                ApiKeyStore::default().save(&key)?;
                println!("{}", "API key stored in the system keyring.".green());
            }
        }
        Ok(())
    }

    fn password_or_prompt(password: Option<String>) -> Result<String> {
        match password {
            Some(p) => Ok(p),
            None => Ok(DefaultEditor::new()?.readline("Password: ")?),
        }
    }
}
