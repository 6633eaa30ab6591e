//! Read-aloud behaviour of the conversation panel.
//!
//! [`Conversation`] watches the transcript and speaks each new agent entry
//! through a [`SpeechSynthesizer`], honouring the mute toggle.

use tracing::debug;

use crate::transcript::Transcript;

pub const SPEECH_RATE: f32 = 0.95;
pub const SPEECH_PITCH: f32 = 1.0;

/// One request to the speech engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    pub voice: Option<String>,
}

impl Utterance {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rate: SPEECH_RATE,
            pitch: SPEECH_PITCH,
            voice: None,
        }
    }

    pub fn with_voice(mut self, voice: Option<String>) -> Self {
        self.voice = voice;
        self
    }
}

/// A text-to-speech engine.
pub trait SpeechSynthesizer: Send {
    /// Start speaking. Implementations may fail silently.
    fn speak(&mut self, utterance: Utterance);

    /// Stop whatever is being spoken.
    fn cancel(&mut self);

    /// Whether an utterance is still playing.
    fn is_speaking(&mut self) -> bool;
}

/// Engine that never makes a sound.
#[derive(Debug, Default)]
pub struct SilentSpeech;

impl SpeechSynthesizer for SilentSpeech {
    fn speak(&mut self, _utterance: Utterance) {}
    fn cancel(&mut self) {}
    fn is_speaking(&mut self) -> bool {
        false
    }
}

/// Indicator shown in the conversation header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioStatus {
    Muted,
    Speaking,
    On,
}

impl AudioStatus {
    pub fn label(self) -> &'static str {
        match self {
            AudioStatus::Muted => "Muted",
            AudioStatus::Speaking => "Speaking...",
            AudioStatus::On => "Audio On",
        }
    }
}

/// Speech state for the transcript.
pub struct Conversation {
    speech: Box<dyn SpeechSynthesizer>,
    muted: bool,
    voice: Option<String>,
    seen: usize,
}

impl Conversation {
    pub fn new(speech: Box<dyn SpeechSynthesizer>) -> Self {
        Self {
            speech,
            muted: false,
            voice: None,
            seen: 0,
        }
    }

    pub fn with_voice(mut self, voice: Option<String>) -> Self {
        self.voice = voice;
        self
    }

    /// React to the transcript. Speaks only when it grew and the newest
    /// entry is an agent entry.
    pub fn observe(&mut self, transcript: &Transcript) {
        if transcript.len() <= self.seen {
            return;
        }
        self.seen = transcript.len();

        if self.muted {
            return;
        }
        let Some(entry) = transcript.last().filter(|e| e.is_agent()) else {
            return;
        };

        debug!(chars = entry.text.len(), "speaking agent entry");
        self.speech.cancel();
        self.speech
            .speak(Utterance::new(entry.text.clone()).with_voice(self.voice.clone()));
    }

    /// Flip the mute flag, cancelling speech when muting.
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        if self.muted {
            self.speech.cancel();
        }
        self.muted
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn audio_status(&mut self) -> AudioStatus {
        if self.muted {
            AudioStatus::Muted
        } else if self.speech.is_speaking() {
            AudioStatus::Speaking
        } else {
            AudioStatus::On
        }
    }
}

impl Drop for Conversation {
    fn drop(&mut self) {
        self.speech.cancel();
    }
}
