//! Narrative agent orchestrator.
//!
//! Turns a [`StoryNode`] into an [`AgentResponse`] by asking the generative
//! service for a retelling and an illustration at the same time. The
//! orchestrator never fails: every error becomes a fallback value.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use gemini::{Gemini, ImageConfig, Request};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::StoryNode;
use crate::config::StoryMapConfig;
use crate::prompts::{image_prompt, text_prompt, ImagePrompt, TextPrompt};
use crate::transcript::DataUri;

pub const DEFAULT_TEXT_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-3-pro-image-preview";

pub const UNCONFIGURED_TEXT: &str = "System Alert: API Key not detected in environment variables. Please configure the satellite uplink.";
pub const TEXT_FAILURE: &str = "Transmission Interrupted.";
pub const EMPTY_TEXT: &str = "The Archives are silent.";

/// Errors from a single generative call.
#[derive(Debug, Error)]
pub enum NarratorError {
    #[error("Gemini API error: {0}")]
    Gemini(#[from] gemini::Error),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

/// Advisory mood of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmotionalTone {
    Wondrous,
    Analytical,
}

/// Combined result of one orchestration.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentResponse {
    pub text: String,
    /// Illustration as a `data:` URI.
    pub image_url: Option<String>,
    pub tone: EmotionalTone,
}

/// The generative backend, as seen by the orchestrator.
#[async_trait]
pub trait StoryService: Send + Sync {
    /// Generate the narrative text.
    async fn generate_text(&self, prompt: TextPrompt) -> Result<String, NarratorError>;

    /// Generate an illustration. `Ok(None)` means the service answered
    /// without an image.
    async fn generate_image(&self, prompt: ImagePrompt) -> Result<Option<String>, NarratorError>;
}

/// [`StoryService`] backed by the Gemini REST API.
#[derive(Debug, Clone)]
pub struct GeminiStoryService {
    client: Gemini,
    text_model: String,
    image_model: String,
}

impl GeminiStoryService {
    pub fn new(client: Gemini) -> Self {
        Self {
            client,
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
        }
    }

    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }
}

#[async_trait]
impl StoryService for GeminiStoryService {
    async fn generate_text(&self, prompt: TextPrompt) -> Result<String, NarratorError> {
        let request = Request::prompt(prompt.body)
            .with_model(&self.text_model)
            .with_system(prompt.system_instruction)
            .with_temperature(prompt.temperature);

        let response = self.client.generate(request).await?;
        Ok(response.text())
    }

    async fn generate_image(&self, prompt: ImagePrompt) -> Result<Option<String>, NarratorError> {
        let request = Request::prompt(prompt.body)
            .with_model(&self.image_model)
            .with_image_config(ImageConfig::new(prompt.aspect_ratio, prompt.image_size));

        let response = self.client.generate(request).await?;
        Ok(response.first_inline_data().map(|data| data.to_data_uri()))
    }
}

/// Outcome of constructing the generative client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarratorInit {
    Ready,
    Unconfigured,
}

/// The orchestrator. Cheap to clone; clones share the service.
#[derive(Clone)]
pub struct Narrator {
    service: Option<Arc<dyn StoryService>>,
}

impl std::fmt::Debug for Narrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Narrator")
            .field("status", &self.status())
            .finish()
    }
}

impl Narrator {
    pub fn new(service: Arc<dyn StoryService>) -> Self {
        Self {
            service: Some(service),
        }
    }

    /// A narrator with no credential; every response is the degraded one.
    pub fn unconfigured() -> Self {
        Self { service: None }
    }

    /// Build a Gemini-backed narrator, or an unconfigured one when no API
    /// key is present.
    pub fn from_config(config: &StoryMapConfig) -> Self {
        let Some(api_key) = config.api_key.as_deref() else {
            warn!("Gemini API key is missing; narrator runs in degraded mode");
            return Self::unconfigured();
        };

        match Gemini::new(api_key) {
            Ok(client) => {
                info!(
                    text_model = %config.text_model,
                    image_model = %config.image_model,
                    "narrator ready"
                );
                let service = GeminiStoryService::new(client)
                    .with_text_model(&config.text_model)
                    .with_image_model(&config.image_model);
                Self::new(Arc::new(service))
            }
            Err(e) => {
                warn!(error = %e, "failed to initialise Gemini client");
                Self::unconfigured()
            }
        }
    }

    pub fn status(&self) -> NarratorInit {
        if self.service.is_some() {
            NarratorInit::Ready
        } else {
            NarratorInit::Unconfigured
        }
    }

    /// Produce the combined response for `node`. Never fails.
    pub async fn generate_story_response(&self, node: &StoryNode) -> AgentResponse {
        let Some(service) = self.service.as_deref() else {
            return AgentResponse {
                text: UNCONFIGURED_TEXT.to_string(),
                image_url: None,
                tone: EmotionalTone::Analytical,
            };
        };

        debug!(node = node.id, "requesting story text and image");

        let text = AssertUnwindSafe(service.generate_text(text_prompt(node))).catch_unwind();
        let image = AssertUnwindSafe(service.generate_image(image_prompt(node))).catch_unwind();
        let (text, image) = futures::join!(text, image);

        let text = match text {
            Ok(Ok(text)) if text.trim().is_empty() => EMPTY_TEXT.to_string(),
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(node = node.id, error = %e, "text generation failed");
                TEXT_FAILURE.to_string()
            }
            Err(_) => {
                warn!(node = node.id, "text generation panicked");
                TEXT_FAILURE.to_string()
            }
        };

        let image_url = match image {
            Ok(Ok(Some(uri))) if DataUri::parse(&uri).is_err() => {
                warn!(node = node.id, "image generation returned a malformed data URI");
                None
            }
            Ok(Ok(image)) => image,
            Ok(Err(e)) => {
                warn!(node = node.id, error = %e, "image generation failed");
                None
            }
            Err(_) => {
                warn!(node = node.id, "image generation panicked");
                None
            }
        };

        AgentResponse {
            text,
            image_url,
            tone: EmotionalTone::Wondrous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::STORY_NODES;
    use crate::testing::{MockStoryService, Scripted};

    fn narrator(mock: &Arc<MockStoryService>) -> Narrator {
        Narrator::new(mock.clone())
    }

    #[tokio::test]
    async fn test_unconfigured_is_degraded() {
        let narrator = Narrator::unconfigured();
        assert_eq!(narrator.status(), NarratorInit::Unconfigured);

        let response = narrator.generate_story_response(&STORY_NODES[0]).await;
        assert_eq!(response.text, UNCONFIGURED_TEXT);
        assert_eq!(response.image_url, None);
        assert_eq!(response.tone, EmotionalTone::Analytical);
    }

    #[test]
    fn test_from_config_without_key() {
        let config = StoryMapConfig::default();
        assert_eq!(Narrator::from_config(&config).status(), NarratorInit::Unconfigured);

        let config = StoryMapConfig::default().with_api_key("test-key");
        assert_eq!(Narrator::from_config(&config).status(), NarratorInit::Ready);
    }

    #[tokio::test]
    async fn test_success_combines_text_and_image() {
        let mock = Arc::new(
            MockStoryService::new()
                .with_text(Scripted::Ok("Once, at the ridge...".into()))
                .with_image(Scripted::Ok(Some("data:image/png;base64,AAAA".into()))),
        );

        let response = narrator(&mock).generate_story_response(&STORY_NODES[0]).await;
        assert_eq!(response.text, "Once, at the ridge...");
        assert_eq!(response.image_url.as_deref(), Some("data:image/png;base64,AAAA"));
        assert_eq!(response.tone, EmotionalTone::Wondrous);
        assert_eq!(mock.text_calls(), 1);
        assert_eq!(mock.image_calls(), 1);
        assert!(mock.last_text_prompt().unwrap().body.contains("Ganesha with Mouse"));
        let illustration = mock.last_image_prompt().unwrap();
        assert!(illustration.body.contains("Ganesha with Mouse"));
        assert_eq!(illustration.aspect_ratio, "16:9");
    }

    #[tokio::test]
    async fn test_empty_image_payload_is_dropped() {
        let empty = gemini::InlineData {
            mime_type: "image/png".into(),
            data: String::new(),
        };
        let mock = Arc::new(
            MockStoryService::new()
                .with_text(Scripted::Ok("A tale.".into()))
                .with_image(Scripted::Ok(Some(empty.to_data_uri()))),
        );

        let response = narrator(&mock).generate_story_response(&STORY_NODES[2]).await;
        assert_eq!(response.text, "A tale.");
        assert_eq!(response.image_url, None);
    }

    #[tokio::test]
    async fn test_image_failure_keeps_text() {
        let mock = Arc::new(
            MockStoryService::new()
                .with_text(Scripted::Ok("A tale.".into()))
                .with_image(Scripted::Err("quota".into())),
        );

        let response = narrator(&mock).generate_story_response(&STORY_NODES[1]).await;
        assert_eq!(response.text, "A tale.");
        assert_eq!(response.image_url, None);
    }

    #[tokio::test]
    async fn test_text_failure_keeps_image() {
        let mock = Arc::new(
            MockStoryService::new()
                .with_text(Scripted::Err("timeout".into()))
                .with_image(Scripted::Ok(Some("data:image/png;base64,BBBB".into()))),
        );

        let response = narrator(&mock).generate_story_response(&STORY_NODES[1]).await;
        assert_eq!(response.text, TEXT_FAILURE);
        assert!(response.image_url.is_some());
    }

    #[tokio::test]
    async fn test_empty_text_and_missing_image() {
        let mock = Arc::new(
            MockStoryService::new()
                .with_text(Scripted::Ok("   ".into()))
                .with_image(Scripted::Ok(None)),
        );

        let response = narrator(&mock).generate_story_response(&STORY_NODES[2]).await;
        assert_eq!(response.text, EMPTY_TEXT);
        assert_eq!(response.image_url, None);
        assert_eq!(response.tone, EmotionalTone::Wondrous);
    }

    #[tokio::test]
    async fn test_panicking_call_falls_back() {
        let mock = Arc::new(
            MockStoryService::new()
                .with_text(Scripted::Panic)
                .with_image(Scripted::Panic),
        );

        let response = narrator(&mock).generate_story_response(&STORY_NODES[4]).await;
        assert_eq!(response.text, TEXT_FAILURE);
        assert_eq!(response.image_url, None);
    }
}
