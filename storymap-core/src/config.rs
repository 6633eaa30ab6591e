//! Runtime configuration.
//!
//! Values come from the process environment (after `.env` has been loaded
//! by the binary) or from the `with_*` builders.

use thiserror::Error;

use crate::narrator::{DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL};
use crate::viewport::{DEFAULT_DATASET_ID, DEFAULT_NARROW_WIDTH};

pub const DEFAULT_TTS_COMMAND: &str = "espeak-ng";

/// Errors from reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be a number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

/// Configuration for a story map session.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryMapConfig {
    /// Gemini API key. `None` runs the narrator in degraded mode.
    pub api_key: Option<String>,
    pub text_model: String,
    pub image_model: String,
    /// Artist map dataset for the illustrated layer.
    pub dataset_id: String,
    /// External text-to-speech program.
    pub tts_command: String,
    /// Preferred voice, passed to the TTS program.
    pub tts_voice: Option<String>,
    /// Terminal columns below which the layout is narrow.
    pub narrow_width: u16,
}

impl Default for StoryMapConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            dataset_id: DEFAULT_DATASET_ID.to_string(),
            tts_command: DEFAULT_TTS_COMMAND.to_string(),
            tts_voice: None,
            narrow_width: DEFAULT_NARROW_WIDTH,
        }
    }
}

impl StoryMapConfig {
    /// Read configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let narrow_width = match get("STORYMAP_NARROW_WIDTH") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                var: "STORYMAP_NARROW_WIDTH",
                value,
            })?,
            None => defaults.narrow_width,
        };

        Ok(Self {
            api_key: gemini::API_KEY_VARS.iter().find_map(|var| get(*var)),
            text_model: get("STORYMAP_TEXT_MODEL").unwrap_or(defaults.text_model),
            image_model: get("STORYMAP_IMAGE_MODEL").unwrap_or(defaults.image_model),
            dataset_id: get("STORYMAP_DATASET_ID").unwrap_or(defaults.dataset_id),
            tts_command: get("STORYMAP_TTS_COMMAND").unwrap_or(defaults.tts_command),
            tts_voice: get("STORYMAP_TTS_VOICE"),
            narrow_width,
        })
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    pub fn with_dataset_id(mut self, dataset_id: impl Into<String>) -> Self {
        self.dataset_id = dataset_id.into();
        self
    }

    pub fn with_tts_command(mut self, command: impl Into<String>) -> Self {
        self.tts_command = command.into();
        self
    }

    pub fn with_tts_voice(mut self, voice: impl Into<String>) -> Self {
        self.tts_voice = Some(voice.into());
        self
    }

    pub fn with_narrow_width(mut self, columns: u16) -> Self {
        self.narrow_width = columns;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StoryMapConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, StoryMapConfig::default());
        assert_eq!(config.api_key, None);
        assert_eq!(config.text_model, "gemini-3-pro-preview");
        assert_eq!(config.image_model, "gemini-3-pro-image-preview");
        assert_eq!(config.narrow_width, 100);
    }

    #[test]
    fn test_api_key_precedence() {
        let config =
            StoryMapConfig::from_lookup(lookup(&[("API_KEY", "b"), ("GEMINI_API_KEY", "a")]))
                .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("a"));

        let config = StoryMapConfig::from_lookup(lookup(&[("API_KEY", "b")])).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("b"));

        let config = StoryMapConfig::from_lookup(lookup(&[("GEMINI_API_KEY", "  ")])).unwrap();
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn test_overrides() {
        let config = StoryMapConfig::from_lookup(lookup(&[
            ("STORYMAP_TEXT_MODEL", "text-x"),
            ("STORYMAP_IMAGE_MODEL", "image-x"),
            ("STORYMAP_DATASET_ID", "dataset-x"),
            ("STORYMAP_TTS_COMMAND", "say"),
            ("STORYMAP_TTS_VOICE", "David"),
            ("STORYMAP_NARROW_WIDTH", " 72 "),
        ]))
        .unwrap();

        assert_eq!(config.text_model, "text-x");
        assert_eq!(config.image_model, "image-x");
        assert_eq!(config.dataset_id, "dataset-x");
        assert_eq!(config.tts_command, "say");
        assert_eq!(config.tts_voice.as_deref(), Some("David"));
        assert_eq!(config.narrow_width, 72);
    }

    #[test]
    fn test_invalid_narrow_width() {
        let err = StoryMapConfig::from_lookup(lookup(&[("STORYMAP_NARROW_WIDTH", "wide")]))
            .unwrap_err();
        assert!(err.to_string().contains("STORYMAP_NARROW_WIDTH"));
    }

    #[test]
    fn test_builders() {
        let config = StoryMapConfig::default()
            .with_api_key("k")
            .with_narrow_width(60)
            .with_tts_voice("Google US English");
        assert_eq!(config.api_key.as_deref(), Some("k"));
        assert_eq!(config.narrow_width, 60);
        assert_eq!(config.tts_voice.as_deref(), Some("Google US English"));
    }
}
