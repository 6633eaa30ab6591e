//! Read-aloud through an external text-to-speech program.

use std::path::Path;
use std::process::{Child, Command, Stdio};

use storymap_core::{SpeechSynthesizer, Utterance};
use tracing::{debug, warn};

/// espeak's default speaking rate, in words per minute.
const BASE_WPM: f32 = 175.0;
/// espeak's default pitch on its 0-99 scale.
const BASE_PITCH: f32 = 50.0;

/// Speaks by spawning a TTS command per utterance; cancelling kills it.
pub struct CommandSpeech {
    program: String,
    child: Option<Child>,
    /// Set after the first spawn failure so a missing program is logged once.
    unavailable: bool,
}

impl CommandSpeech {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            child: None,
            unavailable: false,
        }
    }
}

/// Command-line arguments for `program` to speak `utterance`.
pub fn speech_args(program: &str, utterance: &Utterance) -> Vec<String> {
    let name = Path::new(program)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(program);
    let wpm = (BASE_WPM * utterance.rate).round() as u32;

    let mut args = Vec::new();
    match name {
        "espeak" | "espeak-ng" => {
            args.push(format!("-s{wpm}"));
            args.push(format!("-p{}", (BASE_PITCH * utterance.pitch).round().clamp(0.0, 99.0)));
            if let Some(voice) = &utterance.voice {
                args.push("-v".to_string());
                args.push(voice.clone());
            }
        }
        "say" => {
            args.push("-r".to_string());
            args.push(wpm.to_string());
            if let Some(voice) = &utterance.voice {
                args.push("-v".to_string());
                args.push(voice.clone());
            }
        }
        _ => {}
    }
    args.push("--".to_string());
    args.push(utterance.text.clone());
    args
}

impl SpeechSynthesizer for CommandSpeech {
    fn speak(&mut self, utterance: Utterance) {
        if self.unavailable {
            return;
        }
        self.cancel();

        let spawned = Command::new(&self.program)
            .args(speech_args(&self.program, &utterance))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(child) => {
                debug!(program = %self.program, pid = child.id(), "speech started");
                self.child = Some(child);
            }
            Err(e) => {
                warn!(program = %self.program, error = %e, "text-to-speech unavailable");
                self.unavailable = true;
            }
        }
    }

    fn cancel(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Ok(None) = child.try_wait() {
                let _ = child.kill();
            }
            let _ = child.wait();
        }
    }

    fn is_speaking(&mut self) -> bool {
        match self.child.as_mut().map(Child::try_wait) {
            Some(Ok(None)) => true,
            Some(_) => {
                self.child = None;
                false
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_espeak_args() {
        let utterance = Utterance::new("The winged horse.").with_voice(Some("en-us".into()));
        let args = speech_args("/usr/bin/espeak-ng", &utterance);
        assert_eq!(args, vec!["-s166", "-p50", "-v", "en-us", "--", "The winged horse."]);
    }

    #[test]
    fn test_say_args() {
        let args = speech_args("say", &Utterance::new("hi"));
        assert_eq!(args, vec!["-r", "166", "--", "hi"]);
    }

    #[test]
    fn test_unknown_program_gets_text_only() {
        let args = speech_args("my-tts", &Utterance::new("hi"));
        assert_eq!(args, vec!["--", "hi"]);
    }

    #[test]
    fn test_missing_program_is_silent() {
        let mut speech = CommandSpeech::new("storymap-no-such-tts-program");
        speech.speak(Utterance::new("hello"));
        assert!(!speech.is_speaking());
        speech.cancel();
    }
}
