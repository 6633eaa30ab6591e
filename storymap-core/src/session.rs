//! StorySession - the high-level API the front ends drive.
//!
//! Wires the controller, viewport, narrator and conversation together:
//! a selection re-targets the viewport and spawns an orchestration task;
//! completions come back over a channel and are applied by [`pump`].
//!
//! [`pump`]: StorySession::pump

use std::time::Instant;

use tokio::sync::mpsc;

use crate::catalog::StoryNode;
use crate::config::StoryMapConfig;
use crate::controller::{dispatch, StoryCompletion, StoryController};
use crate::conversation::{AudioStatus, Conversation, SpeechSynthesizer};
use crate::narrator::{Narrator, NarratorInit};
use crate::transcript::Transcript;
use crate::viewport::{Retarget, Viewport};

/// What a selection started.
#[derive(Debug, Clone)]
pub struct Selection {
    pub ticket: u64,
    /// Present when the viewport moved and a layer load should be probed.
    pub retarget: Option<Retarget>,
}

/// One running story map.
pub struct StorySession {
    narrator: Narrator,
    controller: StoryController,
    viewport: Viewport,
    conversation: Conversation,
    tx: mpsc::UnboundedSender<StoryCompletion>,
    rx: mpsc::UnboundedReceiver<StoryCompletion>,
}

impl StorySession {
    pub fn new(
        catalog: &'static [StoryNode],
        narrator: Narrator,
        viewport: Viewport,
        conversation: Conversation,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            narrator,
            controller: StoryController::new(catalog),
            viewport,
            conversation,
            tx,
            rx,
        }
    }

    /// Build a session from configuration with the given speech engine.
    pub fn from_config(
        catalog: &'static [StoryNode],
        config: &StoryMapConfig,
        speech: Box<dyn SpeechSynthesizer>,
        now: Instant,
    ) -> Self {
        let narrator = Narrator::from_config(config);
        let viewport = Viewport::new(config.dataset_id.clone(), config.narrow_width, now);
        let conversation = Conversation::new(speech).with_voice(config.tts_voice.clone());
        Self::new(catalog, narrator, viewport, conversation)
    }

    /// Auto-select the first catalog entry, exactly as a user would.
    pub fn start(&mut self, now: Instant) -> Option<Selection> {
        let first = self.controller.startup_selection()?;
        Some(self.select(first, now))
    }

    /// Select `node`: re-target the viewport and start the orchestration.
    /// Must be called from within a tokio runtime.
    pub fn select(&mut self, node: &StoryNode, now: Instant) -> Selection {
        let retarget = self.viewport.focus(Some(node), now);
        let pending = self.controller.begin(node);
        let ticket = pending.ticket;
        self.conversation.observe(self.controller.transcript());
        dispatch(self.narrator.clone(), pending, self.tx.clone());
        Selection { ticket, retarget }
    }

    /// Apply every completion that has already arrived. Returns how many.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.rx.try_recv() {
            self.apply(completion);
            applied += 1;
        }
        applied
    }

    /// Wait for the next completion and apply it. Returns `false` when
    /// nothing is in flight.
    pub async fn next_completion(&mut self) -> bool {
        if !self.controller.is_loading() {
            return false;
        }
        match self.rx.recv().await {
            Some(completion) => {
                self.apply(completion);
                true
            }
            None => false,
        }
    }

    /// Wait until every in-flight orchestration has settled.
    pub async fn wait_idle(&mut self) {
        while self.next_completion().await {}
    }

    fn apply(&mut self, completion: StoryCompletion) {
        self.controller.settle(completion.ticket, completion.outcome);
        self.conversation.observe(self.controller.transcript());
    }

    /// Advance viewport timers. Returns true when loading cleared.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.viewport.tick(now)
    }

    pub fn viewport_loaded(&mut self, generation: u64, now: Instant) -> bool {
        self.viewport.layer_loaded(generation, now)
    }

    pub fn resize(&mut self, width: u16, now: Instant) -> Option<Retarget> {
        self.viewport.resize(width, now)
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.conversation.toggle_mute()
    }

    pub fn audio_status(&mut self) -> AudioStatus {
        self.conversation.audio_status()
    }

    pub fn narrator_status(&self) -> NarratorInit {
        self.narrator.status()
    }

    pub fn catalog(&self) -> &'static [StoryNode] {
        self.controller.catalog()
    }

    pub fn selected(&self) -> Option<&StoryNode> {
        self.controller.selected()
    }

    pub fn transcript(&self) -> &Transcript {
        self.controller.transcript()
    }

    pub fn is_loading(&self) -> bool {
        self.controller.is_loading()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::STORY_NODES;
    use crate::testing::RecordingSpeech;
    use crate::viewport::{DEFAULT_DATASET_ID, DEFAULT_NARROW_WIDTH};

    fn session(speech: &RecordingSpeech) -> StorySession {
        let now = Instant::now();
        StorySession::new(
            STORY_NODES,
            Narrator::unconfigured(),
            Viewport::new(DEFAULT_DATASET_ID, DEFAULT_NARROW_WIDTH, now),
            Conversation::new(Box::new(speech.clone())),
        )
    }

    #[tokio::test]
    async fn test_start_selects_first_node() {
        let speech = RecordingSpeech::new();
        let mut session = session(&speech);
        let selection = session.start(Instant::now()).unwrap();

        assert!(selection.retarget.is_some());
        assert_eq!(session.selected().map(|n| n.id), Some("ganesha-mouse"));
        assert!(session.is_loading());

        session.wait_idle().await;
        assert!(!session.is_loading());
        assert_eq!(session.transcript().len(), 2);
        assert_eq!(speech.spoken().len(), 1);
    }

    #[tokio::test]
    async fn test_next_completion_when_idle() {
        let speech = RecordingSpeech::new();
        let mut session = session(&speech);
        assert!(!session.next_completion().await);
        assert_eq!(session.pump(), 0);
    }

    #[tokio::test]
    async fn test_reselecting_same_node_keeps_viewport() {
        let speech = RecordingSpeech::new();
        let mut session = session(&speech);
        let now = Instant::now();
        session.select(&STORY_NODES[2], now);
        let again = session.select(&STORY_NODES[2], now);

        assert!(again.retarget.is_none());
        session.wait_idle().await;
        assert_eq!(session.transcript().len(), 4);
    }
}
