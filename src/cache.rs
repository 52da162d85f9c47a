//! Local persisted key-value cache
//!
//! Holds small JSON-serialized blobs that must survive restarts: theme
//! settings, the signed-in account and the chat state snapshot. Backed by an
//! embedded `sled` database.

use crate::error::{ChatmateError, Result};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::Db;
use std::path::{Path, PathBuf};

/// Key holding [`crate::theme::ThemeSettings`]
pub const THEME_KEY: &str = "theme";
/// Key holding [`crate::auth::AuthSession`]
pub const AUTH_KEY: &str = "auth";
/// Key holding [`crate::store::ChatState`]
pub const CHAT_STATE_KEY: &str = "chat_state";

/// Typed JSON cache over a `sled` tree
pub struct LocalCache {
    db: Db,
}

impl LocalCache {
    /// Open or create a cache at `path`
    ///
    /// # Errors
    ///
    /// Returns `ChatmateError::Cache` if the database cannot be opened
    ///
    /// # Examples
    ///
    /// ```
    /// use chatmate::cache::LocalCache;
    ///
    /// # fn main() -> chatmate::error::Result<()> {
    /// let dir = tempfile::tempdir()?;
    /// let cache = LocalCache::open(dir.path().join("cache"))?;
    /// cache.set("greeting", &"hello")?;
    /// assert_eq!(cache.get::<String>("greeting")?, Some("hello".to_string()));
    /// # Ok(())
    /// # }
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path.as_ref())
            .map_err(|e| ChatmateError::Cache(format!("Failed to open cache: {}", e)))?;
        Ok(Self { db })
    }

    /// Open a throwaway in-memory cache
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| ChatmateError::Cache(format!("Failed to open cache: {}", e)))?;
        Ok(Self { db })
    }

    /// Read and deserialize `key`
    ///
    /// A value that no longer deserializes (for example after a format
    /// change) is treated as absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(bytes) = self
            .db
            .get(key.as_bytes())
            .map_err(|e| ChatmateError::Cache(format!("Get failed: {}", e)))?
        else {
            return Ok(None);
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!("Discarding unreadable cache entry {}: {}", key, e);
                Ok(None)
            }
        }
    }

    /// Serialize and store `value` under `key`, flushing to disk
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| ChatmateError::Cache(format!("Serialization failed: {}", e)))?;

        self.db
            .insert(key.as_bytes(), bytes)
            .map_err(|e| ChatmateError::Cache(format!("Insert failed: {}", e)))?;
        self.db
            .flush()
            .map_err(|e| ChatmateError::Cache(format!("Flush failed: {}", e)))?;

        Ok(())
    }

    /// Remove `key`; removing a missing key is not an error
    pub fn remove(&self, key: &str) -> Result<()> {
        self.db
            .remove(key.as_bytes())
            .map_err(|e| ChatmateError::Cache(format!("Remove failed: {}", e)))?;
        self.db
            .flush()
            .map_err(|e| ChatmateError::Cache(format!("Flush failed: {}", e)))?;
        Ok(())
    }
}

/// Default cache directory in the platform cache location
pub fn default_cache_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "chatmate", "chatmate")
        .ok_or_else(|| ChatmateError::Cache("Could not determine cache directory".into()))?;
    Ok(proj_dirs.cache_dir().join("kv"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::{ThemeMode, ThemeSettings};

    #[test]
    fn test_get_missing_key_is_none() {
        let cache = LocalCache::temporary().unwrap();
        assert!(cache.get::<ThemeSettings>(THEME_KEY).unwrap().is_none());
    }

    #[test]
    fn test_set_then_get() {
        let cache = LocalCache::temporary().unwrap();
        let settings = ThemeSettings {
            mode: ThemeMode::Dark,
            font_scale: 1.2,
        };
        cache.set(THEME_KEY, &settings).unwrap();
        assert_eq!(cache.get::<ThemeSettings>(THEME_KEY).unwrap(), Some(settings));
    }

    #[test]
    fn test_remove_key() {
        let cache = LocalCache::temporary().unwrap();
        cache.set(AUTH_KEY, &"token").unwrap();
        cache.remove(AUTH_KEY).unwrap();
        cache.remove(AUTH_KEY).unwrap();
        assert!(cache.get::<String>(AUTH_KEY).unwrap().is_none());
    }

    #[test]
    fn test_unreadable_entry_treated_as_absent() {
        let cache = LocalCache::temporary().unwrap();
        cache.set(THEME_KEY, &42).unwrap();
        assert!(cache.get::<ThemeSettings>(THEME_KEY).unwrap().is_none());
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache");
        {
            let cache = LocalCache::open(&path).unwrap();
            cache.set(CHAT_STATE_KEY, &vec![1, 2, 3]).unwrap();
        }
        let cache = LocalCache::open(&path).unwrap();
        assert_eq!(
            cache.get::<Vec<i32>>(CHAT_STATE_KEY).unwrap(),
            Some(vec![1, 2, 3])
        );
    }
}
