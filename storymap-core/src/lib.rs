//! Story map engine with an AI narrator.
//!
//! This crate provides:
//! - A curated catalog of geo-located mythological story nodes
//! - A dual-layer viewport model (satellite embed plus illustrated overlay)
//! - A narrator that asks Gemini for a retelling and an illustration at once
//! - Transcript, read-aloud and headless front-end plumbing
//!
//! # Quick Start
//!
//! ```ignore
//! use std::time::Instant;
//! use storymap_core::{SilentSpeech, StoryMapConfig, StorySession, STORY_NODES};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StoryMapConfig::from_env()?;
//!     let mut session =
//!         StorySession::from_config(STORY_NODES, &config, Box::new(SilentSpeech), Instant::now());
//!
//!     session.start(Instant::now());
//!     session.wait_idle().await;
//!
//!     for entry in session.transcript().entries() {
//!         println!("{}", entry.text);
//!     }
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod controller;
pub mod conversation;
pub mod headless;
pub mod narrator;
pub mod prompts;
pub mod session;
pub mod testing;
pub mod transcript;
pub mod viewport;

// Primary public API
pub use catalog::{Coordinates, StoryNode, STORY_NODES};
pub use config::{ConfigError, StoryMapConfig};
pub use conversation::{AudioStatus, Conversation, SilentSpeech, SpeechSynthesizer, Utterance};
pub use headless::{HeadlessCommand, HeadlessExplorer};
pub use narrator::{AgentResponse, EmotionalTone, Narrator, NarratorInit};
pub use session::StorySession;
pub use testing::{MockStoryService, RecordingSpeech, TestHarness};
pub use transcript::{Transcript, TranscriptEntry};
pub use viewport::{Viewport, ViewportState};
