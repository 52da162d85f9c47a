//! Sign-in state and credentials
//!
//! The signed-in account is an [`AuthSession`] cached in the [`LocalCache`]
//! under [`AUTH_KEY`]; the generative API key is kept separately by
//! [`ApiKeyStore`].

pub mod credentials;
pub mod identity;

pub use credentials::ApiKeyStore;
pub use identity::{HttpIdentityProvider, IdentityProvider};

use crate::cache::{LocalCache, AUTH_KEY};
use crate::error::{ChatmateError, Result};
use crate::models::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A signed-in account and its bearer token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub user: User,
    pub id_token: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    /// Whether the token has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Cached session, if any; expired sessions are still returned
pub fn cached_session(cache: &LocalCache) -> Result<Option<AuthSession>> {
    cache.get(AUTH_KEY)
}

/// The signed-in user
///
/// # Errors
///
/// Returns `NotSignedIn` when no session is cached
pub fn current_user(cache: &LocalCache) -> Result<User> {
    cached_session(cache)?
        .map(|s| s.user)
        .ok_or_else(|| ChatmateError::NotSignedIn.into())
}

/// Cache a freshly obtained session
pub fn save_session(cache: &LocalCache, session: &AuthSession) -> Result<()> {
    cache.set(AUTH_KEY, session)
}

/// Drop the cached session
pub fn clear_session(cache: &LocalCache) -> Result<()> {
    cache.remove(AUTH_KEY)
}
