//! Identity provider integration tests
//!
//! Runs `HttpIdentityProvider` against a `wiremock` server shaped like an
//! identity-toolkit REST API, and checks the session is cached for
//! `current_user`.

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chatmate::auth::{self, HttpIdentityProvider, IdentityProvider};
use chatmate::cache::LocalCache;
use chatmate::config::IdentityConfig;
use chatmate::error::ChatmateError;

fn make_provider(base_url: &str) -> HttpIdentityProvider {
    HttpIdentityProvider::new(&IdentityConfig {
        api_base: format!("{}/v1", base_url),
        api_key: Some("project-key".to_string()),
    })
    .expect("provider")
}

#[tokio::test]
async fn test_sign_in_returns_session_and_caches_user() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .and(query_param("key", "project-key"))
        .and(body_partial_json(json!({
            "email": "ada@example.com",
            "password": "hunter22",
            "returnSecureToken": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "localId": "uid-1",
            "email": "ada@example.com",
            "displayName": "Ada",
            "idToken": "token-1",
            "refreshToken": "refresh-1",
            "expiresIn": "3600"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = make_provider(&server.uri())
        .sign_in(" ada@example.com ", "hunter22")
        .await
        .expect("sign in");
    assert_eq!(session.user.id, "uid-1");
    assert_eq!(session.user.display_name, "Ada");
    assert_eq!(session.id_token, "token-1");
    assert!(!session.is_expired());

    let cache = LocalCache::temporary().expect("cache");
    auth::save_session(&cache, &session).expect("save");
    assert_eq!(auth::current_user(&cache).expect("user").email, "ada@example.com");
}

#[tokio::test]
async fn test_sign_in_bad_password_is_authentication_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "INVALID_LOGIN_CREDENTIALS"}
        })))
        .mount(&server)
        .await;

    let err = make_provider(&server.uri())
        .sign_in("ada@example.com", "wrong")
        .await
        .unwrap_err();
    match err.downcast_ref::<ChatmateError>() {
        Some(ChatmateError::Authentication(msg)) => assert_eq!(msg, "Invalid email or password"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_sign_up_uses_requested_display_name() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts:signUp"))
        .and(body_partial_json(json!({"displayName": "Grace"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "localId": "uid-2",
            "email": "grace@example.com",
            "idToken": "token-2",
            "expiresIn": "3600"
        })))
        .mount(&server)
        .await;

    let session = make_provider(&server.uri())
        .sign_up("grace@example.com", "s3cret!", "Grace")
        .await
        .expect("sign up");
    assert_eq!(session.user.display_name, "Grace");
}

#[tokio::test]
async fn test_sign_up_existing_email() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts:signUp"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "EMAIL_EXISTS"}
        })))
        .mount(&server)
        .await;

    let err = make_provider(&server.uri())
        .sign_up("grace@example.com", "s3cret!", "Grace")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("already exists"));
}
