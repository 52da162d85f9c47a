//! Configuration management for Chatmate
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{ChatmateError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for Chatmate
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Generative provider settings
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Where sessions and custom agents are stored
    #[serde(default)]
    pub storage: StorageConfig,
    /// Identity provider settings
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Local key-value cache settings
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Gemini provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL (useful for tests and local mocks)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Environment variable consulted for the API key when the keyring has
    /// none
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Sampling parameters
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Safety filter settings
    #[serde(default)]
    pub safety: SafetyConfig,
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
            generation: GenerationConfig::default(),
            safety: SafetyConfig::default(),
        }
    }
}

/// Sampling parameters sent with every request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

fn default_temperature() -> f32 {
    0.9
}

fn default_top_k() -> u32 {
    40
}

fn default_top_p() -> f32 {
    0.95
}

fn default_max_output_tokens() -> u32 {
    2048
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_k: default_top_k(),
            top_p: default_top_p(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

/// Blocking threshold applied to every harm category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SafetyThreshold {
    BlockNone,
    BlockOnlyHigh,
    #[default]
    BlockMediumAndAbove,
    BlockLowAndAbove,
}

impl SafetyThreshold {
    /// Wire name used by the Gemini API
    pub fn as_api_str(&self) -> &'static str {
        match self {
            Self::BlockNone => "BLOCK_NONE",
            Self::BlockOnlyHigh => "BLOCK_ONLY_HIGH",
            Self::BlockMediumAndAbove => "BLOCK_MEDIUM_AND_ABOVE",
            Self::BlockLowAndAbove => "BLOCK_LOW_AND_ABOVE",
        }
    }
}

/// Safety filter configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SafetyConfig {
    /// Threshold for all harm categories
    #[serde(default)]
    pub threshold: SafetyThreshold,
}

/// Document store backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Local SQLite file
    #[default]
    Sqlite,
    /// Remote REST collections
    Rest,
    /// In-process, lost on exit
    Memory,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Backend to use
    #[serde(default)]
    pub backend: StorageBackend,

    /// SQLite database path; platform data directory when unset
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Base URL of the remote document store (required for `rest`)
    #[serde(default)]
    pub remote_url: Option<String>,
}

/// Identity provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Identity toolkit base URL
    #[serde(default = "default_identity_base")]
    pub api_base: String,

    /// Public project API key sent with identity requests
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_identity_base() -> String {
    "https://identitytoolkit.googleapis.com/v1".to_string()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            api_base: default_identity_base(),
            api_key: None,
        }
    }
}

/// Local cache configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheConfig {
    /// Cache directory; platform cache directory when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from file with environment overrides
    ///
    /// A missing file is not an error; defaults are used instead.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::debug!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ChatmateError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ChatmateError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(model) = std::env::var("CHATMATE_MODEL") {
            self.provider.model = model;
        }

        if let Ok(api_base) = std::env::var("CHATMATE_API_BASE") {
            self.provider.api_base = api_base;
        }

        if let Ok(temperature) = std::env::var("CHATMATE_TEMPERATURE") {
            if let Ok(value) = temperature.parse() {
                self.provider.generation.temperature = value;
            } else {
                tracing::warn!("Invalid CHATMATE_TEMPERATURE: {}", temperature);
            }
        }

        if let Ok(max_tokens) = std::env::var("CHATMATE_MAX_OUTPUT_TOKENS") {
            if let Ok(value) = max_tokens.parse() {
                self.provider.generation.max_output_tokens = value;
            } else {
                tracing::warn!("Invalid CHATMATE_MAX_OUTPUT_TOKENS: {}", max_tokens);
            }
        }

        if let Ok(backend) = std::env::var("CHATMATE_STORAGE") {
            self.storage.backend = match backend.to_lowercase().as_str() {
                "sqlite" => StorageBackend::Sqlite,
                "rest" => StorageBackend::Rest,
                "memory" => StorageBackend::Memory,
                _ => {
                    tracing::warn!("Invalid storage backend: {}, using default", backend);
                    StorageBackend::default()
                }
            };
        }

        if let Ok(url) = std::env::var("CHATMATE_REMOTE_URL") {
            self.storage.remote_url = Some(url);
        }

        if let Ok(base) = std::env::var("CHATMATE_IDENTITY_URL") {
            self.identity.api_base = base;
        }

        if let Ok(key) = std::env::var("CHATMATE_IDENTITY_KEY") {
            self.identity.api_key = Some(key);
        }

        if let Ok(path) = std::env::var("CHATMATE_CACHE_DIR") {
            tracing::debug!(path = %path, "Env override: CHATMATE_CACHE_DIR");
            self.cache.path = Some(PathBuf::from(path));
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.provider.model.trim().is_empty() {
            return Err(ChatmateError::Config("provider.model cannot be empty".to_string()).into());
        }

        let generation = &self.provider.generation;
        if !(0.0..=2.0).contains(&generation.temperature) {
            return Err(ChatmateError::Config(
                "provider.generation.temperature must be between 0.0 and 2.0".to_string(),
            )
            .into());
        }

        if generation.top_p.is_nan() || generation.top_p <= 0.0 || generation.top_p > 1.0 {
            return Err(ChatmateError::Config(
                "provider.generation.top_p must be greater than 0.0 and at most 1.0".to_string(),
            )
            .into());
        }

        if generation.top_k == 0 {
            return Err(ChatmateError::Config(
                "provider.generation.top_k must be greater than 0".to_string(),
            )
            .into());
        }

        if generation.max_output_tokens == 0 {
            return Err(ChatmateError::Config(
                "provider.generation.max_output_tokens must be greater than 0".to_string(),
            )
            .into());
        }

        if self.storage.backend == StorageBackend::Rest {
            match self.storage.remote_url.as_deref() {
                Some(url) if url::Url::parse(url).is_ok() => {}
                Some(url) => {
                    return Err(ChatmateError::Config(format!(
                        "storage.remote_url is not a valid URL: {}",
                        url
                    ))
                    .into());
                }
                None => {
                    return Err(ChatmateError::Config(
                        "storage.remote_url is required for the rest backend".to_string(),
                    )
                    .into());
                }
            }
        }

        Ok(())
    }
}
