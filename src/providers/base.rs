//! Generative client trait and request types
//!
//! This module defines the [`GenerativeClient`] trait implemented by the
//! inference backends, the request shape sent to them, and the mapping from
//! raw provider failures to user-facing errors.

use crate::error::{ChatmateError, Result};
use crate::models::{ImageRef, Message};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use futures::Stream;
use std::path::Path;
use std::pin::Pin;

/// Largest image accepted for inline upload (bytes)
pub const MAX_INLINE_IMAGE_BYTES: usize = 4 * 1024 * 1024;

/// A stream of generated text chunks
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Image bytes sent inline with a prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    /// MIME type, e.g. `image/jpeg`
    pub mime_type: String,
    /// Base64-encoded bytes
    pub data: String,
}

impl InlineImage {
    /// Build an inline image from raw bytes, detecting its format
    ///
    /// # Errors
    ///
    /// Returns `Provider` error if the bytes are not a recognised image format
    /// or exceed [`MAX_INLINE_IMAGE_BYTES`]
    ///
    /// # Examples
    ///
    /// ```
    /// use chatmate::providers::InlineImage;
    ///
    /// // 8-byte PNG signature is enough for format detection
    /// let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    /// let image = InlineImage::from_bytes(&png).unwrap();
    /// assert_eq!(image.mime_type, "image/png");
    /// ```
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > MAX_INLINE_IMAGE_BYTES {
            return Err(ChatmateError::Provider(format!(
                "Image is too large ({} bytes, limit {})",
                bytes.len(),
                MAX_INLINE_IMAGE_BYTES
            ))
            .into());
        }

        let format = image::guess_format(bytes)
            .map_err(|e| ChatmateError::Provider(format!("Unsupported image: {}", e)))?;

        Ok(Self {
            mime_type: format.to_mime_type().to_string(),
            data: STANDARD.encode(bytes),
        })
    }

    /// Read and encode an image file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    /// Reference suitable for storing on a [`Message`]
    pub fn to_image_ref(&self, path: Option<&Path>) -> ImageRef {
        ImageRef {
            mime_type: self.mime_type.clone(),
            path: path.map(|p| p.to_string_lossy().to_string()),
            data: if path.is_some() {
                None
            } else {
                Some(self.data.clone())
            },
        }
    }
}

/// Everything needed for one generation call
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    /// The new user prompt
    pub prompt: String,
    /// System instruction, usually the agent's prompt
    pub system_instruction: Option<String>,
    /// Earlier turns of the conversation, oldest first
    pub history: Vec<Message>,
    /// Optional image sent with the prompt
    pub image: Option<InlineImage>,
}

impl GenerationRequest {
    /// A request with only a prompt
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    /// Set the system instruction
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Set the prior conversation turns
    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    /// Attach an image
    pub fn with_image(mut self, image: InlineImage) -> Self {
        self.image = Some(image);
        self
    }
}

/// Text generation backend
///
/// Calls are single-attempt: there is no retry and no timeout beyond the
/// HTTP client's default.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    /// Generate the full response text
    ///
    /// # Errors
    ///
    /// Returns `EmptyResponse`, `SafetyBlocked` or `RateLimited` for the known
    /// failure modes and `Provider` for everything else
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Generate the response as a stream of text chunks
    ///
    /// The default implementation yields the full response as one chunk.
    async fn generate_stream(&self, request: &GenerationRequest) -> Result<TextStream> {
        let text = self.generate(request).await?;
        Ok(Box::pin(futures::stream::once(async move { Ok(text) })))
    }

    /// Name of the model in use
    fn model(&self) -> String;
}

/// Map a raw provider failure message to a friendlier error
///
/// Matching is on known substrings, case-insensitively. Messages that match
/// nothing are kept as `Provider` errors.
///
/// # Examples
///
/// ```
/// use chatmate::error::ChatmateError;
/// use chatmate::providers::map_provider_error;
///
/// assert!(matches!(
///     map_provider_error("429 Too Many Requests: RESOURCE_EXHAUSTED"),
///     ChatmateError::RateLimited
/// ));
/// assert!(matches!(
///     map_provider_error("connection reset"),
///     ChatmateError::Provider(_)
/// ));
/// ```
pub fn map_provider_error(message: &str) -> ChatmateError {
    let lower = message.to_lowercase();

    if lower.contains("429")
        || lower.contains("resource_exhausted")
        || lower.contains("quota")
        || lower.contains("rate limit")
    {
        ChatmateError::RateLimited
    } else if lower.contains("safety")
        || lower.contains("blocked")
        || lower.contains("prohibited_content")
    {
        ChatmateError::SafetyBlocked
    } else if lower.contains("empty response") || lower.contains("no candidates") {
        ChatmateError::EmptyResponse
    } else {
        ChatmateError::Provider(message.to_string())
    }
}
