//! Gemini (Google) image generation client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::{HeadshotError, Result};
use crate::generation::{build_instruction, ImageGenerator};
use crate::image::ImageBytes;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Builder for [`GeminiClient`].
#[derive(Debug, Clone)]
pub struct GeminiClientBuilder {
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl Default for GeminiClientBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
        }
    }
}

impl GeminiClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the API root, e.g. to point at a local mock.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the API key. Without one, `GEMINI_API_KEY` is read on every call.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn build(self) -> GeminiClient {
        GeminiClient {
            http: reqwest::Client::new(),
            base_url: self.base_url,
            model: self.model,
            api_key: self.api_key,
        }
    }
}

/// Calls Gemini's `generateContent` with the photo and the style instruction.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn builder() -> GeminiClientBuilder {
        GeminiClientBuilder::new()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn api_key(&self) -> Result<String> {
        resolve_api_key(self.api_key.as_deref(), |var| std::env::var(var).ok())
    }

    async fn generate_impl(&self, image: &ImageBytes, style: &str) -> Result<ImageBytes> {
        let start = Instant::now();
        let api_key = self.api_key()?;

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = GeminiRequest::new(image, &build_instruction(style));

        tracing::info!(
            model = %self.model,
            media_type = image.media_type(),
            "sending generation request"
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "gemini request failed");
                HeadshotError::from(e)
            })?;

        let status = response.status();
        let text = response.text().await?;
        tracing::debug!(
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "gemini responded"
        );

        if !status.is_success() {
            return Err(parse_error(status, &text));
        }

        let parsed: GeminiResponse = serde_json::from_str(&text)
            .map_err(|e| HeadshotError::generation_failed(format!("unreadable response: {e}")))?;

        let result = first_inline_image(parsed)?;
        tracing::info!(
            media_type = result.media_type(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "headshot generated"
        );
        Ok(result)
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate(&self, image: &ImageBytes, style: &str) -> Result<ImageBytes> {
        self.generate_impl(image, style).await
    }
}

/// An explicit key wins; otherwise `lookup` is asked for `GEMINI_API_KEY`.
fn resolve_api_key(
    explicit: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String> {
    match explicit {
        Some(key) => Ok(key.to_string()),
        None => lookup(API_KEY_VAR)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                HeadshotError::generation_failed(format!("{API_KEY_VAR} is not set"))
            }),
    }
}

/// Prefers the service's own `error.message`, then the raw body, then the status.
fn parse_error(status: reqwest::StatusCode, body: &str) -> HeadshotError {
    let message = serde_json::from_str::<GeminiErrorResponse>(body)
        .ok()
        .and_then(|e| e.error.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            let body = body.trim();
            if body.is_empty() {
                status.to_string()
            } else {
                body.chars().take(500).collect()
            }
        });

    tracing::warn!(status = status.as_u16(), %message, "gemini request failed");
    HeadshotError::generation_failed(message)
}

/// Scans the first candidate's parts in order; the first inline image wins.
fn first_inline_image(response: GeminiResponse) -> Result<ImageBytes> {
    let inline = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.inline_data)
        .find(|d| {
            d.mime_type
                .as_deref()
                .map_or(true, |m| m.starts_with("image/"))
        })
        .ok_or_else(|| {
            tracing::warn!("gemini response carried no inline image");
            HeadshotError::NoImageInResponse
        })?;

    let media_type = inline.mime_type.unwrap_or_else(|| "image/png".to_string());
    ImageBytes::new(media_type, inline.data)
        .map_err(|e| HeadshotError::generation_failed(format!("malformed image in response: {e}")))
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
}

impl GeminiRequest {
    fn new(image: &ImageBytes, instruction: &str) -> Self {
        let parts = vec![
            GeminiRequestPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type: image.media_type().to_string(),
                    data: image.data().to_string(),
                },
            },
            GeminiRequestPart::Text {
                text: instruction.to_string(),
            },
        ];

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: vec!["IMAGE".to_string()],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default, alias = "inline_data")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default, alias = "mime_type")]
    mime_type: Option<String>,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    #[serde(default)]
    message: Option<String>,
}
