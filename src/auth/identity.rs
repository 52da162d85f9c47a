//! Email/password identity provider
//!
//! Talks to an identity-toolkit style REST API: `accounts:signInWithPassword`
//! and `accounts:signUp`, both authorised with a project API key passed as
//! the `key` query parameter.

use crate::auth::AuthSession;
use crate::config::IdentityConfig;
use crate::error::{ChatmateError, Result};
use crate::models::User;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sign-in backend
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Sign in with email and password
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession>;

    /// Create an account and sign in to it
    async fn sign_up(&self, email: &str, password: &str, display_name: &str)
        -> Result<AuthSession>;

    /// End a session
    ///
    /// Tokens are stateless, so by default there is nothing to revoke
    /// remotely; callers still drop their cached copy.
    async fn sign_out(&self, session: &AuthSession) -> Result<()> {
        tracing::debug!("Signing out {}", session.user.email);
        Ok(())
    }
}

/// [`IdentityProvider`] over HTTP
pub struct HttpIdentityProvider {
    client: Client,
    api_base: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    email: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
    id_token: String,
    /// Lifetime in seconds, sent as a string
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdentityErrorEnvelope {
    error: IdentityErrorBody,
}

#[derive(Debug, Deserialize)]
struct IdentityErrorBody {
    #[serde(default)]
    message: String,
}

impl AccountResponse {
    fn into_session(self, fallback_name: Option<&str>) -> AuthSession {
        let lifetime = self
            .expires_in
            .as_deref()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(3600);

        let display_name = self
            .display_name
            .filter(|n| !n.is_empty())
            .or_else(|| fallback_name.map(str::to_string))
            .unwrap_or_else(|| default_display_name(&self.email));

        AuthSession {
            user: User {
                id: self.local_id,
                email: self.email,
                display_name,
                avatar_url: self.photo_url,
            },
            id_token: self.id_token,
            expires_at: Utc::now() + ChronoDuration::seconds(lifetime),
        }
    }
}

fn default_display_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

/// Turn the provider's error code into a readable error
fn map_identity_error(code: &str) -> ChatmateError {
    // Codes may carry a detail suffix, e.g. "WEAK_PASSWORD : Password should be..."
    let code = code.split(" : ").next().unwrap_or(code).trim();
    match code {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            ChatmateError::Authentication("Invalid email or password".to_string())
        }
        "USER_DISABLED" => ChatmateError::Authentication("This account has been disabled".into()),
        "EMAIL_EXISTS" => {
            ChatmateError::Authentication("An account with this email already exists".into())
        }
        "INVALID_EMAIL" => ChatmateError::Authentication("Email address is not valid".into()),
        "WEAK_PASSWORD" => ChatmateError::Authentication(
            "Password is too weak (at least 6 characters)".to_string(),
        ),
        "TOO_MANY_ATTEMPTS_TRY_LATER" => ChatmateError::RateLimited,
        other => ChatmateError::Authentication(other.to_string()),
    }
}

impl HttpIdentityProvider {
    /// Create a provider from config
    ///
    /// # Errors
    ///
    /// Returns `MissingCredentials` if no identity API key is configured
    pub fn new(config: &IdentityConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ChatmateError::MissingCredentials(
                    "identity api_key is not configured (set CHATMATE_IDENTITY_KEY)".to_string(),
                )
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("chatmate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ChatmateError::Authentication(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn post_account(&self, method: &str, body: &PasswordRequest<'_>) -> Result<AccountResponse> {
        let url = format!("{}/accounts:{}", self.api_base, method);
        tracing::debug!("Identity request: accounts:{}", method);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Identity request failed: {}", e);
                ChatmateError::Authentication(format!("Identity service unreachable: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!("Identity service returned {}: {}", status, text);
            return Err(match serde_json::from_str::<IdentityErrorEnvelope>(&text) {
                Ok(envelope) => map_identity_error(&envelope.error.message),
                Err(_) => ChatmateError::Authentication(format!("Identity service error {}", status)),
            }
            .into());
        }

        response.json::<AccountResponse>().await.map_err(|e| {
            ChatmateError::Authentication(format!("Unexpected identity response: {}", e)).into()
        })
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let body = PasswordRequest {
            email: email.trim(),
            password,
            display_name: None,
            return_secure_token: true,
        };
        let session = self
            .post_account("signInWithPassword", &body)
            .await?
            .into_session(None);
        tracing::info!("Signed in as {}", session.user.email);
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<AuthSession> {
        let display_name = display_name.trim();
        let name = (!display_name.is_empty()).then_some(display_name);
        let body = PasswordRequest {
            email: email.trim(),
            password,
            display_name: name,
            return_secure_token: true,
        };
        let session = self.post_account("signUp", &body).await?.into_session(name);
        tracing::info!("Created account {}", session.user.email);
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_api_key() {
        let config = IdentityConfig::default();
        assert!(HttpIdentityProvider::new(&config).is_err());
    }

    #[test]
    fn test_error_code_mapping() {
        assert!(matches!(
            map_identity_error("INVALID_PASSWORD"),
            ChatmateError::Authentication(ref m) if m == "Invalid email or password"
        ));
        assert!(matches!(
            map_identity_error("WEAK_PASSWORD : Password should be at least 6 characters"),
            ChatmateError::Authentication(ref m) if m.contains("too weak")
        ));
        assert!(matches!(
            map_identity_error("TOO_MANY_ATTEMPTS_TRY_LATER"),
            ChatmateError::RateLimited
        ));
    }

    #[test]
    fn test_into_session_uses_fallback_name() {
        let response: AccountResponse = serde_json::from_str(
            r#"{"localId":"u1","email":"ada@example.com","idToken":"tok","expiresIn":"60"}"#,
        )
        .unwrap();
        let session = response.into_session(None);
        assert_eq!(session.user.display_name, "ada");
        assert!(session.expires_at > Utc::now());
        assert!(session.expires_at <= Utc::now() + ChronoDuration::seconds(60));
    }

    #[test]
    fn test_password_request_shape() {
        let body = PasswordRequest {
            email: "a@b.c",
            password: "pw",
            display_name: None,
            return_secure_token: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["returnSecureToken"], true);
        assert!(json.get("displayName").is_none());
    }
}
