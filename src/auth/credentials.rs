//! Generative API key storage
//!
//! The key lives in the system keyring. An environment variable is consulted
//! when the keyring has no entry or is unavailable (headless machines, CI).

use crate::error::{ChatmateError, Result};

const KEYRING_SERVICE: &str = "chatmate";
const KEYRING_USER: &str = "gemini_api_key";

/// Keyring-backed API key store
#[derive(Debug, Clone)]
pub struct ApiKeyStore {
    keyring_service: String,
    keyring_user: String,
}

impl Default for ApiKeyStore {
    fn default() -> Self {
        Self {
            keyring_service: KEYRING_SERVICE.to_string(),
            keyring_user: KEYRING_USER.to_string(),
        }
    }
}

impl ApiKeyStore {
    /// Store under a custom keyring service/user pair
    pub fn new(service: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            keyring_service: service.into(),
            keyring_user: user.into(),
        }
    }

    /// Save the key in the keyring
    pub fn save(&self, api_key: &str) -> Result<()> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(ChatmateError::MissingCredentials("API key is empty".to_string()).into());
        }
        let entry = keyring::Entry::new(&self.keyring_service, &self.keyring_user)?;
        entry.set_password(api_key)?;
        tracing::info!("Stored API key in keyring");
        Ok(())
    }

    /// Key from the keyring, if one is stored
    fn from_keyring(&self) -> Option<String> {
        let entry = match keyring::Entry::new(&self.keyring_service, &self.keyring_user) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Keyring not available: {}", e);
                return None;
            }
        };
        match entry.get_password() {
            Ok(key) if !key.trim().is_empty() => Some(key),
            Ok(_) | Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                tracing::warn!("Failed to read API key from keyring: {}", e);
                None
            }
        }
    }

    /// Resolve the key: keyring first, then the `env_var` environment variable
    ///
    /// # Errors
    ///
    /// Returns `MissingCredentials` if neither source has a key
    pub fn resolve(&self, env_var: &str) -> Result<String> {
        if let Some(key) = self.from_keyring() {
            return Ok(key);
        }
        resolve_from_env(env_var)
    }

    /// Remove the stored key; a missing entry is not an error
    pub fn clear(&self) -> Result<()> {
        let entry = keyring::Entry::new(&self.keyring_service, &self.keyring_user)?;
        match entry.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn resolve_from_env(env_var: &str) -> Result<String> {
    match std::env::var(env_var) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(ChatmateError::MissingCredentials(format!(
            "No API key found. Run `chatmate auth set-api-key` or set {}",
            env_var
        ))
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_keyring_names() {
        let store = ApiKeyStore::default();
        assert_eq!(store.keyring_service, "chatmate");
        assert_eq!(store.keyring_user, "gemini_api_key");
    }

    #[test]
    #[serial]
    fn test_env_fallback() {
        std::env::set_var("CHATMATE_TEST_KEY_A", "  abc123 ");
        assert_eq!(resolve_from_env("CHATMATE_TEST_KEY_A").unwrap(), "abc123");
        std::env::remove_var("CHATMATE_TEST_KEY_A");
    }

    #[test]
    #[serial]
    fn test_missing_env_is_missing_credentials() {
        std::env::remove_var("CHATMATE_TEST_KEY_B");
        let err = resolve_from_env("CHATMATE_TEST_KEY_B").unwrap_err();
        match err.downcast_ref::<ChatmateError>() {
            Some(ChatmateError::MissingCredentials(msg)) => {
                assert!(msg.contains("CHATMATE_TEST_KEY_B"))
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_save_rejects_blank_key() {
        assert!(ApiKeyStore::new("chatmate-test", "blank").save("   ").is_err());
    }

    #[test]
    #[serial]
    fn test_clear_without_stored_key_is_ok() {
        keyring::set_default_credential_builder(keyring::mock::default_credential_builder());
        let store = ApiKeyStore::new("chatmate-test", "clear");
        store.clear().unwrap();
        assert!(store.from_keyring().is_none());
    }
}
