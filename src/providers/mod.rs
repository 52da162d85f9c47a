//! Provider module for Chatmate
//!
//! This module contains the generative client abstraction and the Gemini
//! implementation.

pub mod base;
pub mod gemini;

pub use base::{
    map_provider_error, GenerationRequest, GenerativeClient, InlineImage, TextStream,
    MAX_INLINE_IMAGE_BYTES,
};
pub use gemini::GeminiProvider;

use crate::auth::ApiKeyStore;
use crate::config::ProviderConfig;
use crate::error::Result;
use std::sync::Arc;

/// Create the generative client described by `config`
///
/// The API key is read from the keyring, falling back to the environment
/// variable named by `config.api_key_env`.
///
/// # Errors
///
/// Returns `MissingCredentials` if no API key can be found, or an error if
/// the client fails to initialize
pub fn create_client(config: &ProviderConfig) -> Result<Arc<dyn GenerativeClient>> {
    let api_key = ApiKeyStore::default().resolve(&config.api_key_env)?;
    create_client_with_key(config, api_key)
}

/// Create the generative client with an explicit API key
pub fn create_client_with_key(
    config: &ProviderConfig,
    api_key: impl Into<String>,
) -> Result<Arc<dyn GenerativeClient>> {
    Ok(Arc::new(GeminiProvider::new(config.clone(), api_key)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_with_key_reports_model() {
        let mut config = ProviderConfig::default();
        config.model = "gemini-1.5-pro".to_string();
        let client = create_client_with_key(&config, "k").unwrap();
        assert_eq!(client.model(), "gemini-1.5-pro");
    }

    #[test]
    fn test_create_client_with_blank_key_fails() {
        assert!(create_client_with_key(&ProviderConfig::default(), "").is_err());
    }
}
