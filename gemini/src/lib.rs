//! Minimal Google Gemini API client.
//!
//! This crate provides a focused client for the `generateContent` endpoint with:
//! - Text generation with a system instruction and temperature
//! - Image generation through `imageConfig` (aspect ratio, image size)
//! - Extraction of inline image payloads as data URIs

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-3-pro-preview";

/// Environment variables holding the API key, in order of precedence.
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Errors that can occur when using the Gemini client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("API key not configured")]
    NoApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Gemini API client.
#[derive(Clone)]
pub struct Gemini {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for Gemini {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gemini")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl Gemini {
    /// Create a new Gemini client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self, Error> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::NoApiKey);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: API_BASE.to_string(),
        })
    }

    /// Set the default model for this client.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point the client at a different API root (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// The model used when a request does not name one.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a `generateContent` request and return the parsed response.
    pub async fn generate(&self, request: Request) -> Result<Response, Error> {
        let model = request.model.clone().unwrap_or_else(|| self.model.clone());
        let api_request = build_api_request(&request);
        let headers = self.build_headers()?;

        debug!(model = %model, image = request.image_config.is_some(), "sending generateContent request");

        let response = self
            .client
            .post(format!("{}/models/{model}:generateContent", self.base_url))
            .headers(headers)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: api_error_message(&body),
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        Ok(parse_response(api_response))
    }

    fn build_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| Error::Config(format!("Invalid API key: {e}")))?,
        );
        Ok(headers)
    }
}

// ============================================================================
// Public types
// ============================================================================

/// A `generateContent` request.
#[derive(Debug, Clone)]
pub struct Request {
    pub model: Option<String>,
    pub contents: Vec<Content>,
    pub system_instruction: Option<String>,
    pub temperature: Option<f32>,
    pub image_config: Option<ImageConfig>,
}

impl Request {
    /// Create a new request with the given conversation contents.
    pub fn new(contents: Vec<Content>) -> Self {
        Self {
            model: None,
            contents,
            system_instruction: None,
            temperature: None,
            image_config: None,
        }
    }

    /// Create a single-turn request from a user prompt.
    pub fn prompt(text: impl Into<String>) -> Self {
        Self::new(vec![Content::user(text)])
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_system(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_image_config(mut self, config: ImageConfig) -> Self {
        self.image_config = Some(config);
        self
    }
}

/// Image generation options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageConfig {
    /// Aspect ratio such as `"16:9"`.
    pub aspect_ratio: String,
    /// Resolution bucket such as `"1K"`.
    pub image_size: String,
}

impl ImageConfig {
    pub fn new(aspect_ratio: impl Into<String>, image_size: impl Into<String>) -> Self {
        Self {
            aspect_ratio: aspect_ratio.into(),
            image_size: image_size.into(),
        }
    }
}

/// One turn of conversation content.
#[derive(Debug, Clone)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Content {
    /// Create a user turn with text content.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::Text(text.into())],
        }
    }

}

/// The role of a content author.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

impl Role {
    fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// A piece of content.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    InlineData(InlineData),
}

impl Part {
    /// Extract text from a text part.
    pub fn as_text(&self) -> Option<&str> {
        if let Part::Text(text) = self {
            Some(text)
        } else {
            None
        }
    }

    /// Extract the blob from an inline data part.
    pub fn as_inline_data(&self) -> Option<&InlineData> {
        if let Part::InlineData(data) = self {
            Some(data)
        } else {
            None
        }
    }
}

/// Base64-encoded binary content returned inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineData {
    pub mime_type: String,
    /// Base64 payload, exactly as sent by the API.
    pub data: String,
}

impl InlineData {
    /// Render as a `data:` URI.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// A `generateContent` response.
#[derive(Debug, Clone)]
pub struct Response {
    pub candidates: Vec<Candidate>,
    pub model_version: Option<String>,
    pub usage: Option<Usage>,
}

impl Response {
    /// Text of the first candidate, with all text parts concatenated.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .map(|c| {
                c.parts
                    .iter()
                    .filter_map(Part::as_text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }

    /// First inline payload of the first candidate, if any.
    pub fn first_inline_data(&self) -> Option<&InlineData> {
        self.candidates
            .first()?
            .parts
            .iter()
            .find_map(Part::as_inline_data)
    }
}

/// One generated candidate.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub parts: Vec<Part>,
    pub finish_reason: Option<String>,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub candidate_tokens: u32,
    pub total_tokens: u32,
}

// ============================================================================
// Internal API types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest {
    contents: Vec<ApiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<ApiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<ApiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiContent {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ApiPart>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ApiPart {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    inline_data: Option<ApiBlob>,
    #[serde(skip_serializing, default)]
    thought: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiBlob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<ApiImageConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiImageConfig {
    aspect_ratio: String,
    image_size: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
    #[serde(default)]
    model_version: Option<String>,
    #[serde(default)]
    usage_metadata: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCandidate {
    #[serde(default)]
    content: Option<ApiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

fn to_api_part(part: &Part) -> ApiPart {
    match part {
        Part::Text(text) => ApiPart {
            text: Some(text.clone()),
            ..ApiPart::default()
        },
        Part::InlineData(blob) => ApiPart {
            inline_data: Some(ApiBlob {
                mime_type: blob.mime_type.clone(),
                data: blob.data.clone(),
            }),
            ..ApiPart::default()
        },
    }
}

fn build_api_request(request: &Request) -> ApiRequest {
    let contents = request
        .contents
        .iter()
        .map(|c| ApiContent {
            role: Some(c.role.as_str().to_string()),
            parts: c.parts.iter().map(to_api_part).collect(),
        })
        .collect();

    let system_instruction = request.system_instruction.as_ref().map(|s| ApiContent {
        role: None,
        parts: vec![to_api_part(&Part::Text(s.clone()))],
    });

    let generation_config = if request.temperature.is_some() || request.image_config.is_some() {
        Some(ApiGenerationConfig {
            temperature: request.temperature,
            image_config: request.image_config.as_ref().map(|ic| ApiImageConfig {
                aspect_ratio: ic.aspect_ratio.clone(),
                image_size: ic.image_size.clone(),
            }),
        })
    } else {
        None
    };

    ApiRequest {
        contents,
        system_instruction,
        generation_config,
    }
}

fn parse_response(api_response: ApiResponse) -> Response {
    let candidates = api_response
        .candidates
        .into_iter()
        .map(|c| Candidate {
            parts: c
                .content
                .map(|content| content.parts)
                .unwrap_or_default()
                .into_iter()
                // Thought summaries are not part of the answer.
                .filter(|p| !p.thought)
                .filter_map(|p| match (p.text, p.inline_data) {
                    (_, Some(blob)) => Some(Part::InlineData(InlineData {
                        mime_type: blob.mime_type,
                        data: blob.data,
                    })),
                    (Some(text), None) => Some(Part::Text(text)),
                    (None, None) => None,
                })
                .collect(),
            finish_reason: c.finish_reason,
        })
        .collect();

    Response {
        candidates,
        model_version: api_response.model_version,
        usage: api_response.usage_metadata.map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            candidate_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        }),
    }
}

/// Pull the human-readable message out of an error body, if it is the usual envelope.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_creation() {
        let client = Gemini::new("test-key").unwrap();
        assert_eq!(client.model(), DEFAULT_MODEL);
        assert_eq!(client.base_url, API_BASE);
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(Gemini::new("  "), Err(Error::NoApiKey)));
    }

    #[test]
    fn test_client_with_model_and_base_url() {
        let client = Gemini::new("test-key")
            .unwrap()
            .with_model("gemini-3-pro-image-preview")
            .with_base_url("http://localhost:8080/v1beta/");
        assert_eq!(client.model(), "gemini-3-pro-image-preview");
        assert_eq!(client.base_url, "http://localhost:8080/v1beta");
    }

    #[test]
    fn test_debug_hides_key() {
        let client = Gemini::new("super-secret").unwrap();
        assert!(!format!("{client:?}").contains("super-secret"));
    }

    #[test]
    fn test_request_builder() {
        let request = Request::prompt("Hello")
            .with_system("You are a keeper of myths")
            .with_temperature(0.7)
            .with_image_config(ImageConfig::new("16:9", "1K"));

        assert_eq!(request.contents.len(), 1);
        assert_eq!(request.temperature, Some(0.7));
        assert!(request.system_instruction.is_some());
        assert_eq!(request.image_config.unwrap().aspect_ratio, "16:9");
    }

    #[test]
    fn test_request_wire_format() {
        let request = Request::prompt("Recite")
            .with_system("Preserve")
            .with_temperature(0.5)
            .with_image_config(ImageConfig::new("16:9", "1K"));

        let value = serde_json::to_value(build_api_request(&request)).unwrap();
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "Recite");
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "Preserve");
        assert!(value["systemInstruction"].get("role").is_none());
        assert_eq!(value["generationConfig"]["temperature"], 0.5);
        assert_eq!(value["generationConfig"]["imageConfig"]["aspectRatio"], "16:9");
        assert_eq!(value["generationConfig"]["imageConfig"]["imageSize"], "1K");
    }

    #[test]
    fn test_request_without_config_omits_generation_config() {
        let value = serde_json::to_value(build_api_request(&Request::prompt("hi"))).unwrap();
        assert!(value.get("generationConfig").is_none());
        assert!(value.get("systemInstruction").is_none());
    }

    #[test]
    fn test_parse_text_response() {
        let api: ApiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        {"text": "thinking aloud", "thought": true},
                        {"text": "In the beginning "},
                        {"text": "was the word."}
                    ]
                },
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 5, "totalTokenCount": 15},
            "modelVersion": "gemini-3-pro-preview"
        }))
        .unwrap();

        let response = parse_response(api);
        assert_eq!(response.text(), "In the beginning was the word.");
        assert!(response.first_inline_data().is_none());
        assert_eq!(response.usage.unwrap().total_tokens, 15);
        assert_eq!(response.candidates[0].finish_reason.as_deref(), Some("STOP"));
    }

    #[test]
    fn test_parse_image_response() {
        let api: ApiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "Here is your image"},
                        {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}}
                    ]
                }
            }]
        }))
        .unwrap();

        let response = parse_response(api);
        let blob = response.first_inline_data().unwrap();
        assert_eq!(blob.mime_type, "image/png");
        assert_eq!(blob.to_data_uri(), "data:image/png;base64,iVBORw0KGgo=");
    }

    #[test]
    fn test_parse_blocked_response() {
        // Safety-blocked candidates come back without content.
        let api: ApiResponse = serde_json::from_value(json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }))
        .unwrap();

        let response = parse_response(api);
        assert_eq!(response.text(), "");
        assert!(response.first_inline_data().is_none());
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(api_error_message(body), "API key not valid");
        assert_eq!(api_error_message("upstream timeout"), "upstream timeout");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let client = Gemini::new("test-key")
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        let err = client.generate(Request::prompt("hi")).await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }
}
