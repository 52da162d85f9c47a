//! Error types for Chatmate
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// A single field-level validation failure on user-authored input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Name of the offending form field
    pub field: &'static str,
    /// Human readable description of the problem
    pub message: String,
}

impl FieldError {
    /// Creates a new field error
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{}'?)", s),
        None => String::new(),
    }
}

/// Main error type for Chatmate operations
///
/// The taxonomy is shallow: service errors from the identity, storage and
/// inference providers, validation errors on user input, and content-policy
/// rejections from the inference API.
#[derive(Error, Debug)]
pub enum ChatmateError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generative provider errors that have no friendlier mapping
    #[error("Provider error: {0}")]
    Provider(String),

    /// The model produced no text
    #[error("The assistant returned an empty response. Please try again.")]
    EmptyResponse,

    /// The request or the response was blocked by a safety filter
    #[error("This message was blocked by the content safety filter. Please rephrase and try again.")]
    SafetyBlocked,

    /// The inference API rejected the call because of rate limits or quota
    #[error("Too many requests right now. Please wait a moment and try again.")]
    RateLimited,

    /// No usable API key or account credentials
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// Authentication errors (bad password, expired token, ...)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// An operation needs a signed-in user
    #[error("Not signed in. Run `chatmate auth login` first.")]
    NotSignedIn,

    /// User-authored input failed local validation
    #[error("Validation failed: {}", join_field_errors(.0))]
    Validation(Vec<FieldError>),

    /// An agent with the same id already exists in the catalog
    #[error("Agent already exists: {0}")]
    DuplicateAgent(String),

    /// Agent lookup failed
    #[error("Unknown agent: {id}{}", suggestion_suffix(.suggestion))]
    UnknownAgent {
        /// The id that was asked for
        id: String,
        /// Closest known id, if any is close enough
        suggestion: Option<String>,
    },

    /// Session lookup failed
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Document store errors (database or remote collection operations)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Local key-value cache errors
    #[error("Cache error: {0}")]
    Cache(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

impl ChatmateError {
    /// Whether this error is a notice meant to be shown to the user verbatim
    /// rather than a fault of the application.
    pub fn is_user_notice(&self) -> bool {
        matches!(
            self,
            Self::EmptyResponse
                | Self::SafetyBlocked
                | Self::RateLimited
                | Self::Validation(_)
                | Self::NotSignedIn
        )
    }
}

/// Result type alias for Chatmate operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
