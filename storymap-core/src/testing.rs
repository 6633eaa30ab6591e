//! Testing utilities for the story map.
//!
//! This module provides tools for integration testing:
//! - `MockStoryService` for deterministic orchestration without API calls
//! - `RecordingSpeech` for observing what would have been read aloud
//! - `TestHarness` for scripted selection scenarios
//! - Assertion helpers for verifying session state

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use async_trait::async_trait;

use crate::catalog::{find, StoryNode, STORY_NODES};
use crate::conversation::{Conversation, SpeechSynthesizer, Utterance};
use crate::narrator::{Narrator, NarratorError, StoryService};
use crate::prompts::{ImagePrompt, TextPrompt};
use crate::session::{Selection, StorySession};
use crate::transcript::TranscriptEntry;
use crate::viewport::{Viewport, DEFAULT_DATASET_ID, DEFAULT_NARROW_WIDTH};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A scripted outcome for one mock call.
#[derive(Debug, Clone)]
pub enum Scripted<T> {
    Ok(T),
    Err(String),
    Panic,
}

impl<T> Scripted<T> {
    fn resolve(self, call: &str) -> Result<T, NarratorError> {
        match self {
            Scripted::Ok(value) => Ok(value),
            Scripted::Err(message) => Err(NarratorError::Unavailable(message)),
            Scripted::Panic => panic!("scripted panic in {call}"),
        }
    }
}

#[derive(Default)]
struct MockState {
    texts: VecDeque<Scripted<String>>,
    images: VecDeque<Scripted<Option<String>>>,
    text_prompts: Vec<TextPrompt>,
    image_prompts: Vec<ImagePrompt>,
}

/// A story service that returns scripted outcomes in order.
///
/// When a queue runs dry, text calls answer with a fixed narrative and image
/// calls answer with no image.
#[derive(Default)]
pub struct MockStoryService {
    state: Mutex<MockState>,
}

impl MockStoryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a text outcome.
    pub fn with_text(self, outcome: Scripted<String>) -> Self {
        self.queue_text(outcome);
        self
    }

    /// Queue an image outcome.
    pub fn with_image(self, outcome: Scripted<Option<String>>) -> Self {
        self.queue_image(outcome);
        self
    }

    pub fn queue_text(&self, outcome: Scripted<String>) {
        lock(&self.state).texts.push_back(outcome);
    }

    pub fn queue_image(&self, outcome: Scripted<Option<String>>) {
        lock(&self.state).images.push_back(outcome);
    }

    pub fn text_calls(&self) -> usize {
        lock(&self.state).text_prompts.len()
    }

    pub fn image_calls(&self) -> usize {
        lock(&self.state).image_prompts.len()
    }

    pub fn last_text_prompt(&self) -> Option<TextPrompt> {
        lock(&self.state).text_prompts.last().cloned()
    }

    pub fn last_image_prompt(&self) -> Option<ImagePrompt> {
        lock(&self.state).image_prompts.last().cloned()
    }
}

#[async_trait]
impl StoryService for MockStoryService {
    async fn generate_text(&self, prompt: TextPrompt) -> Result<String, NarratorError> {
        let outcome = {
            let mut state = lock(&self.state);
            state.text_prompts.push(prompt);
            state.texts.pop_front()
        };
        outcome
            .unwrap_or_else(|| Scripted::Ok("The mock archive recites a tale.".to_string()))
            .resolve("generate_text")
    }

    async fn generate_image(&self, prompt: ImagePrompt) -> Result<Option<String>, NarratorError> {
        let outcome = {
            let mut state = lock(&self.state);
            state.image_prompts.push(prompt);
            state.images.pop_front()
        };
        outcome
            .unwrap_or(Scripted::Ok(None))
            .resolve("generate_image")
    }
}

/// What happened to a [`RecordingSpeech`].
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechEvent {
    Speak(Utterance),
    Cancel,
}

#[derive(Default)]
struct SpeechLog {
    events: Vec<SpeechEvent>,
    active: bool,
}

/// Speech engine that records calls. Clones share the same log.
///
/// An utterance stays "active" until cancelled or [`finish`](Self::finish)
/// is called.
#[derive(Clone, Default)]
pub struct RecordingSpeech {
    log: Arc<Mutex<SpeechLog>>,
}

impl RecordingSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SpeechEvent> {
        lock(&self.log).events.clone()
    }

    /// Texts passed to `speak`, in order.
    pub fn spoken(&self) -> Vec<String> {
        lock(&self.log)
            .events
            .iter()
            .filter_map(|e| match e {
                SpeechEvent::Speak(u) => Some(u.text.clone()),
                SpeechEvent::Cancel => None,
            })
            .collect()
    }

    pub fn last_utterance(&self) -> Option<Utterance> {
        lock(&self.log).events.iter().rev().find_map(|e| match e {
            SpeechEvent::Speak(u) => Some(u.clone()),
            SpeechEvent::Cancel => None,
        })
    }

    pub fn is_active(&self) -> bool {
        lock(&self.log).active
    }

    /// Pretend the current utterance finished playing.
    pub fn finish(&self) {
        lock(&self.log).active = false;
    }
}

impl SpeechSynthesizer for RecordingSpeech {
    fn speak(&mut self, utterance: Utterance) {
        let mut log = lock(&self.log);
        log.events.push(SpeechEvent::Speak(utterance));
        log.active = true;
    }

    fn cancel(&mut self) {
        let mut log = lock(&self.log);
        log.events.push(SpeechEvent::Cancel);
        log.active = false;
    }

    fn is_speaking(&mut self) -> bool {
        lock(&self.log).active
    }
}

/// Test harness for running selection scenarios against a mock service.
pub struct TestHarness {
    pub service: Arc<MockStoryService>,
    pub speech: RecordingSpeech,
    pub session: StorySession,
}

impl TestHarness {
    /// Harness over the built-in catalog.
    pub fn new() -> Self {
        Self::with_catalog(STORY_NODES)
    }

    pub fn with_catalog(catalog: &'static [StoryNode]) -> Self {
        let service = Arc::new(MockStoryService::new());
        let speech = RecordingSpeech::new();
        let session = StorySession::new(
            catalog,
            Narrator::new(service.clone()),
            Viewport::new(DEFAULT_DATASET_ID, DEFAULT_NARROW_WIDTH, Instant::now()),
            Conversation::new(Box::new(speech.clone())),
        );
        Self {
            service,
            speech,
            session,
        }
    }

    /// Queue a narrative for the next selection.
    pub fn expect_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.service.queue_text(Scripted::Ok(text.into()));
        self
    }

    /// Queue an illustration for the next selection.
    pub fn expect_image(&mut self, data_uri: impl Into<String>) -> &mut Self {
        self.service.queue_image(Scripted::Ok(Some(data_uri.into())));
        self
    }

    pub fn expect_text_failure(&mut self, message: impl Into<String>) -> &mut Self {
        self.service.queue_text(Scripted::Err(message.into()));
        self
    }

    /// Select a node by id and wait for the orchestration to settle.
    ///
    /// # Panics
    /// If the id is not in the catalog.
    pub async fn select(&mut self, id: &str) -> Selection {
        let node = find(self.session.catalog(), id)
            .unwrap_or_else(|| panic!("no story node with id '{id}'"));
        let selection = self.session.select(node, Instant::now());
        self.session.wait_idle().await;
        selection
    }

    pub fn last_entry(&self) -> Option<&TranscriptEntry> {
        self.session.transcript().last()
    }

    pub fn transcript_len(&self) -> usize {
        self.session.transcript().len()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert the newest transcript entry is an agent entry with this text.
#[track_caller]
pub fn assert_last_agent_text(harness: &TestHarness, expected: &str) {
    let entry = harness.last_entry().expect("Expected a transcript entry");
    assert!(entry.is_agent(), "Expected the newest entry to be from the agent");
    assert_eq!(entry.text, expected);
}

/// Assert the transcript length.
#[track_caller]
pub fn assert_transcript_len(harness: &TestHarness, expected: usize) {
    let actual = harness.transcript_len();
    assert_eq!(actual, expected, "Expected {expected} transcript entries, got {actual}");
}

/// Assert no orchestration is in flight.
#[track_caller]
pub fn assert_idle(harness: &TestHarness) {
    assert!(!harness.session.is_loading(), "Expected no story to be loading");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_harness_basic_flow() {
        let mut harness = TestHarness::new();
        harness
            .expect_text("Once, the dragon coiled.")
            .expect_image("data:image/png;base64,AAAA");

        harness.select("chinese-dragon").await;

        assert_transcript_len(&harness, 2);
        assert_last_agent_text(&harness, "Once, the dragon coiled.");
        assert_idle(&harness);
        assert_eq!(
            harness.last_entry().unwrap().image_url.as_deref(),
            Some("data:image/png;base64,AAAA")
        );
        assert_eq!(harness.speech.spoken(), vec!["Once, the dragon coiled.".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_defaults_when_queue_empty() {
        let service = MockStoryService::new();
        let prompt = crate::prompts::text_prompt(&STORY_NODES[0]);
        let text = service.generate_text(prompt).await.unwrap();
        assert_eq!(text, "The mock archive recites a tale.");

        let image = crate::prompts::image_prompt(&STORY_NODES[0]);
        assert_eq!(service.generate_image(image).await.unwrap(), None);
        assert_eq!((service.text_calls(), service.image_calls()), (1, 1));
    }

    #[test]
    fn test_recording_speech() {
        let mut speech = RecordingSpeech::new();
        speech.speak(Utterance::new("hello"));
        assert!(speech.is_speaking());
        speech.finish();
        assert!(!speech.is_speaking());
        speech.cancel();
        assert_eq!(speech.events().len(), 2);
        assert_eq!(speech.spoken(), vec!["hello".to_string()]);
    }
}
