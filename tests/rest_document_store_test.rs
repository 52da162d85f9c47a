//! REST document store integration tests
//!
//! Exercises `RestDocumentStore` and `ChatStore` against a `wiremock` server
//! serving per-user collections.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chatmate::agents::predefined_agents;
use chatmate::error::ChatmateError;
use chatmate::models::{ChatSession, Message};
use chatmate::store::{ChatStore, DocumentStore, RestDocumentStore};

fn make_store(base_url: &str) -> RestDocumentStore {
    RestDocumentStore::new(&format!("{}/api", base_url), Some("id-token".to_string()))
        .expect("store")
}

fn session_json(id: &str, updated_at: &str) -> serde_json::Value {
    json!({
        "id": id,
        "agentId": "assistant",
        "agentName": "Assistant",
        "messages": [],
        "createdAt": "2024-01-01T00:00:00Z",
        "updatedAt": updated_at
    })
}

#[tokio::test]
async fn test_list_sessions_sends_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users/u1/sessions"))
        .and(header("authorization", "Bearer id-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            session_json("a", "2024-01-02T00:00:00Z"),
            session_json("b", "2024-01-03T00:00:00Z"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let sessions = make_store(&server.uri())
        .list_sessions("u1")
        .await
        .expect("list");
    assert_eq!(sessions.len(), 2);
}

#[tokio::test]
async fn test_chat_store_load_sorts_remote_sessions() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users/u1/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            session_json("old", "2024-01-02T00:00:00Z"),
            session_json("new", "2024-01-05T00:00:00Z"),
            session_json("mid", "2024-01-03T00:00:00Z"),
        ])))
        .mount(&server)
        .await;

    let mut store = ChatStore::new(Arc::new(make_store(&server.uri())));
    store.load_sessions("u1").await;

    let ids: Vec<&str> = store.sessions().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["new", "mid", "old"]);
}

#[tokio::test]
async fn test_chat_store_load_failure_leaves_empty_list() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users/u1/sessions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut store = ChatStore::new(Arc::new(make_store(&server.uri())));
    store.load_sessions("u1").await;
    assert!(store.sessions().is_empty());
}

#[tokio::test]
async fn test_get_missing_session_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users/u1/sessions/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let found = make_store(&server.uri())
        .get_session("u1", "missing")
        .await
        .expect("get");
    assert!(found.is_none());
}

#[tokio::test]
async fn test_put_session_writes_document() {
    let server = MockServer::start().await;
    let agent = predefined_agents()[0].clone();
    let mut session = ChatSession::new(&agent);
    session.messages.push(Message::user("hello"));

    Mock::given(method("PUT"))
        .and(path(format!("/api/users/u1/sessions/{}", session.id)))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    make_store(&server.uri())
        .put_session("u1", &session)
        .await
        .expect("put");

    let requests = server.received_requests().await.expect("recorded");
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).expect("json");
    assert_eq!(body["messages"][0]["content"], "hello");
    assert_eq!(body["agentId"], agent.id);
}

#[tokio::test]
async fn test_delete_unauthorized_is_authentication_error() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/users/u1/sessions/s1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = make_store(&server.uri())
        .delete_session("u1", "s1")
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ChatmateError>(),
        Some(ChatmateError::Authentication(_))
    ));
}

#[tokio::test]
async fn test_delete_missing_document_is_ok() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/users/u1/agents/custom-1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    make_store(&server.uri())
        .delete_custom_agent("u1", "custom-1")
        .await
        .expect("delete");
}
