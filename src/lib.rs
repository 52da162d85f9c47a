//! Chatmate - AI chat assistant library
//!
//! This library provides the core of the Chatmate chat client: the
//! session/message store, the agent catalog, the generative response client,
//! sign-in, local persistence and theme helpers.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `models`: Agents, messages, sessions and users
//! - `store`: Session/message state and document persistence backends
//! - `agents`: Built-in agents and custom agent validation
//! - `providers`: Generative client abstraction and the Gemini implementation
//! - `auth`: Identity provider and credential storage
//! - `cache`: Local key-value cache for settings, sign-in and chat state
//! - `theme`: Palette, typography and spacing tables
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli` / `commands`: Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use chatmate::{ChatStore, Config, Message};
//! use chatmate::store::MemoryDocumentStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml")?;
//!     config.validate()?;
//!
//!     let mut store = ChatStore::new(Arc::new(MemoryDocumentStore::new()));
//!     let agent = store.find_agent("assistant")?.clone();
//!     store.create_session(&agent);
//!     store.add_message(Message::user("Hello!"));
//!     Ok(())
//! }
//! ```

pub mod agents;
pub mod auth;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod providers;
pub mod store;
pub mod theme;

// Re-export commonly used types
pub use config::Config;
pub use error::{ChatmateError, Result};
pub use models::{Agent, AgentCategory, ChatSession, Message, Role, User};
pub use providers::{GenerationRequest, GenerativeClient};
pub use store::{ChatState, ChatStore, DocumentStore};
