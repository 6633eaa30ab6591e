//! Integration tests that call the real Gemini API.
//!
//! These tests require GEMINI_API_KEY (or API_KEY) to be set, via .env file or environment.
//! Run with: `cargo test -p storymap-core --test api_integration -- --ignored --nocapture`
//!
//! These are marked #[ignore] by default to avoid API costs and slow runs.

use storymap_core::narrator::{EmotionalTone, NarratorInit, TEXT_FAILURE};
use storymap_core::{Narrator, StoryMapConfig, STORY_NODES};

fn setup() -> Option<StoryMapConfig> {
    let _ = dotenvy::dotenv();
    let config = StoryMapConfig::from_env().ok()?;
    if config.api_key.is_none() {
        eprintln!("Skipping test: GEMINI_API_KEY not set");
        return None;
    }
    Some(config)
}

#[tokio::test]
#[ignore] // Run with: cargo test -p storymap-core --test api_integration -- --ignored
async fn test_ganesha_story_from_real_api() {
    let Some(config) = setup() else { return };

    let narrator = Narrator::from_config(&config);
    assert_eq!(narrator.status(), NarratorInit::Ready);

    let response = narrator.generate_story_response(&STORY_NODES[0]).await;
    println!("Text: {}", response.text);
    println!(
        "Image: {}",
        response
            .image_url
            .as_deref()
            .map(|u| &u[..u.len().min(48)])
            .unwrap_or("<none>")
    );

    assert_eq!(response.tone, EmotionalTone::Wondrous);
    assert_ne!(response.text, TEXT_FAILURE, "text generation should succeed");
    if let Some(url) = &response.image_url {
        assert!(url.starts_with("data:image/"));
    }
}

#[tokio::test]
#[ignore]
async fn test_bad_key_falls_back() {
    let _ = dotenvy::dotenv();
    let config = StoryMapConfig::default().with_api_key("definitely-not-a-key");

    let response = Narrator::from_config(&config)
        .generate_story_response(&STORY_NODES[3])
        .await;

    assert_eq!(response.text, TEXT_FAILURE);
    assert_eq!(response.image_url, None);
}
