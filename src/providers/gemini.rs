//! Gemini provider implementation for Chatmate
//!
//! This module implements [`GenerativeClient`] over the Gemini REST API
//! (`generateContent` and `streamGenerateContent`), including inline images,
//! generation parameters and safety thresholds.

use crate::config::{GenerationConfig, ProviderConfig, SafetyThreshold};
use crate::error::{ChatmateError, Result};
use crate::models::Role;
use crate::providers::{map_provider_error, GenerationRequest, GenerativeClient, TextStream};

use async_trait::async_trait;
use bytes::Bytes;
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Harm categories a threshold is applied to
const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Finish reasons that mean the candidate was withheld by a filter
const BLOCKED_FINISH_REASONS: [&str; 4] = ["SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII"];

/// Gemini API client
///
/// # Examples
///
/// ```no_run
/// use chatmate::config::ProviderConfig;
/// use chatmate::providers::{GeminiProvider, GenerationRequest, GenerativeClient};
///
/// # async fn example() -> chatmate::error::Result<()> {
/// let provider = GeminiProvider::new(ProviderConfig::default(), "api-key")?;
/// let request = GenerationRequest::new("Hello!").with_system_instruction("Be brief.");
/// let text = provider.generate(&request).await?;
/// # Ok(())
/// # }
/// ```
pub struct GeminiProvider {
    client: Client,
    config: ProviderConfig,
    api_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GeminiGenerationConfig,
    safety_settings: Vec<GeminiSafetySetting>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<GeminiInlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

impl From<&GenerationConfig> for GeminiGenerationConfig {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            temperature: config.temperature,
            top_k: config.top_k,
            top_p: config.top_p,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct GeminiSafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<GeminiPromptFeedback>,
    #[serde(default)]
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiError,
}

impl GeminiError {
    fn into_error(self) -> ChatmateError {
        let mut text = String::new();
        if let Some(code) = self.code {
            text.push_str(&format!("{} ", code));
        }
        if let Some(status) = &self.status {
            text.push_str(&format!("{}: ", status));
        }
        text.push_str(&self.message);
        map_provider_error(text.trim())
    }
}

impl GeminiResponse {
    /// Text of the first candidate, or the error explaining its absence
    ///
    /// With `allow_empty`, a candidate without text is not an error; stream
    /// chunks may legitimately carry no text.
    fn into_text(self, allow_empty: bool) -> std::result::Result<String, ChatmateError> {
        if let Some(error) = self.error {
            return Err(error.into_error());
        }

        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            tracing::warn!("Prompt blocked by provider: {}", reason);
            return Err(ChatmateError::SafetyBlocked);
        }

        let Some(candidate) = self.candidates.into_iter().next() else {
            return if allow_empty {
                Ok(String::new())
            } else {
                Err(ChatmateError::EmptyResponse)
            };
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            if let Some(reason) = candidate.finish_reason.as_deref() {
                if BLOCKED_FINISH_REASONS.contains(&reason) {
                    tracing::warn!("Candidate withheld by provider: {}", reason);
                    return Err(ChatmateError::SafetyBlocked);
                }
            }
            if !allow_empty {
                return Err(ChatmateError::EmptyResponse);
            }
        }

        Ok(text)
    }
}

impl GeminiProvider {
    /// Create a new Gemini provider
    ///
    /// # Errors
    ///
    /// Returns `MissingCredentials` for an empty key, or a provider error if
    /// the HTTP client fails to initialize
    pub fn new(config: ProviderConfig, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ChatmateError::MissingCredentials("Gemini API key is empty".to_string()).into());
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .user_agent(concat!("chatmate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ChatmateError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized Gemini provider: base={}, model={}",
            config.api_base,
            config.model
        );

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.model,
            method
        )
    }

    fn build_request(&self, request: &GenerationRequest) -> GeminiRequest {
        let mut contents: Vec<GeminiContent> = request
            .history
            .iter()
            .filter(|m| !m.content.is_empty() || m.image.is_some())
            .map(|m| {
                let mut parts = Vec::new();
                if !m.content.is_empty() {
                    parts.push(GeminiPart {
                        text: Some(m.content.clone()),
                        inline_data: None,
                    });
                }
                // Only inline payloads can be replayed; path references are
                // sent as text context only.
                if let Some(image) = &m.image {
                    if let Some(data) = &image.data {
                        parts.push(GeminiPart {
                            text: None,
                            inline_data: Some(GeminiInlineData {
                                mime_type: image.mime_type.clone(),
                                data: data.clone(),
                            }),
                        });
                    }
                }
                GeminiContent {
                    role: Some(gemini_role(m.role).to_string()),
                    parts,
                }
            })
            .filter(|c| !c.parts.is_empty())
            .collect();

        let mut parts = vec![GeminiPart {
            text: Some(request.prompt.clone()),
            inline_data: None,
        }];
        if let Some(image) = &request.image {
            parts.push(GeminiPart {
                text: None,
                inline_data: Some(GeminiInlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.data.clone(),
                }),
            });
        }
        contents.push(GeminiContent {
            role: Some("user".to_string()),
            parts,
        });

        let system_instruction = request
            .system_instruction
            .as_ref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: Some(s.clone()),
                    inline_data: None,
                }],
            });

        GeminiRequest {
            contents,
            system_instruction,
            generation_config: (&self.config.generation).into(),
            safety_settings: safety_settings(self.config.safety.threshold),
        }
    }

    async fn send(&self, url: &str, body: &GeminiRequest) -> Result<reqwest::Response> {
        tracing::debug!(
            "Sending Gemini request: {} contents, system_instruction={}",
            body.contents.len(),
            body.system_instruction.is_some()
        );

        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Gemini request failed: {}", e);
                ChatmateError::Provider(format!("Gemini request failed: {}", e))
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await.unwrap_or_default();
        tracing::error!("Gemini returned error {}: {}", status, error_text);
        Err(status_error(status, &error_text).into())
    }
}

fn gemini_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

fn safety_settings(threshold: SafetyThreshold) -> Vec<GeminiSafetySetting> {
    HARM_CATEGORIES
        .iter()
        .map(|category| GeminiSafetySetting {
            category,
            threshold: threshold.as_api_str(),
        })
        .collect()
}

fn status_error(status: StatusCode, body: &str) -> ChatmateError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return ChatmateError::RateLimited;
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return ChatmateError::Authentication(format!("Gemini rejected the API key ({})", status));
    }
    match serde_json::from_str::<GeminiErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.into_error(),
        Err(_) => map_provider_error(&format!("{} {}", status, body)),
    }
}

/// Decode an SSE byte stream into events and forward each parsed chunk's
/// text to `tx`.
///
/// Bytes are only decoded once an event is complete, so a multibyte
/// character split across network chunks arrives intact. Stops at the first
/// error. Sends `EmptyResponse` if the stream finished without producing any
/// text.
async fn forward_sse_text(
    byte_stream: impl Stream<Item = reqwest::Result<Bytes>>,
    tx: mpsc::UnboundedSender<Result<String>>,
) {
    let mut produced = false;
    let events = byte_stream.eventsource();

    tokio::pin!(events);

    while let Some(event) = events.next().await {
        let event = match event {
            Ok(e) => e,
            Err(e) => {
                let _ = tx.send(Err(ChatmateError::Provider(format!(
                    "Stream interrupted: {}",
                    e
                ))
                .into()));
                return;
            }
        };

        match handle_sse_data(&event.data) {
            Ok(Some(text)) => {
                produced = true;
                if tx.send(Ok(text)).is_err() {
                    return;
                }
            }
            Ok(None) => {}
            Err(e) => {
                let _ = tx.send(Err(e.into()));
                return;
            }
        }
    }

    if !produced {
        let _ = tx.send(Err(ChatmateError::EmptyResponse.into()));
    }
}

/// Parse the data of one SSE event into the text it carries
fn handle_sse_data(data: &str) -> std::result::Result<Option<String>, ChatmateError> {
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return Ok(None);
    }

    let response: GeminiResponse = serde_json::from_str(data)
        .map_err(|e| ChatmateError::Provider(format!("Failed to parse stream chunk: {}", e)))?;
    let text = response.into_text(true)?;
    Ok(if text.is_empty() { None } else { Some(text) })
}

#[async_trait]
impl GenerativeClient for GeminiProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let body = self.build_request(request);
        let response = self.send(&self.endpoint("generateContent"), &body).await?;

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}", e);
            ChatmateError::Provider(format!("Failed to parse Gemini response: {}", e))
        })?;

        let text = gemini_response.into_text(false)?;
        tracing::debug!("Gemini response: {} chars", text.len());
        Ok(text)
    }

    async fn generate_stream(&self, request: &GenerationRequest) -> Result<TextStream> {
        let body = self.build_request(request);
        let url = format!("{}?alt=sse", self.endpoint("streamGenerateContent"));
        let response = self.send(&url, &body).await?;

        let (tx, rx) = mpsc::unbounded_channel();
        let byte_stream = response.bytes_stream();
        tokio::spawn(async move {
            forward_sse_text(byte_stream, tx).await;
        });

        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }

    fn model(&self) -> String {
        self.config.model.clone()
    }
}
