//! Gemini provider integration tests
//!
//! Runs `GeminiProvider` against a `wiremock` server standing in for the
//! Gemini REST API.

use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chatmate::config::ProviderConfig;
use chatmate::error::ChatmateError;
use chatmate::models::Message;
use chatmate::providers::{GeminiProvider, GenerationRequest, GenerativeClient};

const GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";
const STREAM_PATH: &str = "/v1beta/models/gemini-1.5-flash:streamGenerateContent";

fn make_provider(base_url: &str) -> GeminiProvider {
    let config = ProviderConfig {
        api_base: base_url.to_string(),
        ..ProviderConfig::default()
    };
    GeminiProvider::new(config, "test-key").expect("provider")
}

fn text_response(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

fn error_kind(err: &anyhow::Error) -> &ChatmateError {
    err.downcast_ref::<ChatmateError>()
        .expect("ChatmateError")
}

#[tokio::test]
async fn test_generate_sends_key_prompt_and_instruction() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "systemInstruction": {"parts": [{"text": "You are terse."}]},
            "generationConfig": {"topK": 40, "maxOutputTokens": 2048}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("Hi there")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = make_provider(&server.uri());
    let request = GenerationRequest::new("Hello")
        .with_system_instruction("You are terse.")
        .with_history(vec![Message::user("Earlier"), Message::assistant("Reply")]);

    let text = provider.generate(&request).await.expect("generate");
    assert_eq!(text, "Hi there");
}

#[tokio::test]
async fn test_generate_prompt_blocked_is_safety_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        })))
        .mount(&server)
        .await;

    let err = make_provider(&server.uri())
        .generate(&GenerationRequest::new("something bad"))
        .await
        .unwrap_err();
    assert!(matches!(error_kind(&err), ChatmateError::SafetyBlocked));
}

#[tokio::test]
async fn test_generate_no_candidates_is_empty_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let err = make_provider(&server.uri())
        .generate(&GenerationRequest::new("hi"))
        .await
        .unwrap_err();
    assert!(matches!(error_kind(&err), ChatmateError::EmptyResponse));
}

#[tokio::test]
async fn test_generate_429_is_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}
        })))
        .mount(&server)
        .await;

    let err = make_provider(&server.uri())
        .generate(&GenerationRequest::new("hi"))
        .await
        .unwrap_err();
    assert!(matches!(error_kind(&err), ChatmateError::RateLimited));
}

#[tokio::test]
async fn test_generate_unknown_failure_is_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"code": 500, "message": "Internal error encountered.", "status": "INTERNAL"}
        })))
        .mount(&server)
        .await;

    let err = make_provider(&server.uri())
        .generate(&GenerationRequest::new("hi"))
        .await
        .unwrap_err();
    match error_kind(&err) {
        ChatmateError::Provider(msg) => assert!(msg.contains("Internal error")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_stream_yields_chunks_in_order() {
    let server = MockServer::start().await;

    let body = format!(
        "data: {}\r\n\r\ndata: {}\r\n\r\n",
        text_response("Once upon"),
        text_response(" a time")
    );

    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .and(query_param("alt", "sse"))
        .and(query_param("key", "test-key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/event-stream"),
        )
        .mount(&server)
        .await;

    let chunks: Vec<String> = make_provider(&server.uri())
        .generate_stream(&GenerationRequest::new("Tell me a story"))
        .await
        .expect("stream")
        .map(|c| c.expect("chunk"))
        .collect()
        .await;

    assert_eq!(chunks, vec!["Once upon".to_string(), " a time".to_string()]);
}

#[tokio::test]
async fn test_stream_safety_stop_surfaces_error() {
    let server = MockServer::start().await;

    let body = format!(
        "data: {}\n\ndata: {}\n\n",
        text_response("Partial"),
        json!({"candidates": [{"finishReason": "SAFETY"}]})
    );

    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/event-stream"),
        )
        .mount(&server)
        .await;

    let results: Vec<_> = make_provider(&server.uri())
        .generate_stream(&GenerationRequest::new("hi"))
        .await
        .expect("stream")
        .collect()
        .await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap(), "Partial");
    let err = results[1].as_ref().unwrap_err();
    assert!(matches!(error_kind(err), ChatmateError::SafetyBlocked));
}
