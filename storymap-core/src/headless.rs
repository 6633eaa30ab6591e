//! Headless explorer for programmatic and scripted use.
//!
//! Drives a [`StorySession`] through line commands instead of a TUI.
//! It's designed for:
//! - Exploring the archive over SSH or in a pipe
//! - Automated testing with real AI responses
//!
//! # Example
//!
//! ```ignore
//! use storymap_core::headless::{HeadlessCommand, HeadlessExplorer};
//!
//! let mut explorer = HeadlessExplorer::new(session);
//! explorer.start().await;
//! let output = explorer.execute(HeadlessCommand::parse("pegasus")?).await;
//! println!("{}", output.text);
//! ```

use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Instant;

use thiserror::Error;

use crate::catalog::{display_order, find, grouped};
use crate::session::StorySession;
use crate::transcript::{export_image, DataUri, Role, TranscriptEntry};

/// Errors from parsing a command line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("{command} expects {expected}")]
    BadArgument {
        command: &'static str,
        expected: &'static str,
    },
}

/// One parsed headless command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadlessCommand {
    /// Select by 1-based display number or by node id.
    Select(String),
    List,
    View,
    Slider(i32),
    Opacity(i32),
    /// Simulate a display width in columns.
    Narrow(u16),
    Mute,
    Save(PathBuf),
    Help,
    Quit,
    Empty,
}

impl HeadlessCommand {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Self::Empty);
        }
        let Some(rest) = line.strip_prefix('#') else {
            return Ok(Self::Select(line.to_string()));
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        let number = |command: &'static str| {
            arg.parse::<i32>().map_err(|_| CommandError::BadArgument {
                command,
                expected: "a number",
            })
        };

        match name.to_lowercase().as_str() {
            "list" => Ok(Self::List),
            "view" => Ok(Self::View),
            "slider" => number("#slider").map(Self::Slider),
            "opacity" => number("#opacity").map(Self::Opacity),
            "narrow" => arg
                .parse::<u16>()
                .map(Self::Narrow)
                .map_err(|_| CommandError::BadArgument {
                    command: "#narrow",
                    expected: "a width in columns",
                }),
            "mute" => Ok(Self::Mute),
            "save" if !arg.is_empty() => Ok(Self::Save(PathBuf::from(arg))),
            "save" => Err(CommandError::BadArgument {
                command: "#save",
                expected: "a file path",
            }),
            "help" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(CommandError::Unknown(format!("#{other}"))),
        }
    }
}

pub const HELP_TEXT: &str = "\
Commands:
  <number> | <id>   Select a story node
  #list             Show the archive
  #view             Show the viewport state
  #slider N         Set the reveal slider (0-100)
  #opacity N        Set the overlay opacity (0-100)
  #narrow N         Simulate a display N columns wide
  #mute             Toggle read-aloud
  #save PATH        Save the latest illustration
  #help             Show this help
  #quit             Exit";

/// Output of one command.
#[derive(Debug, Clone, Default)]
pub struct HeadlessOutput {
    pub text: String,
    pub quit: bool,
}

impl HeadlessOutput {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quit: false,
        }
    }
}

/// A story session controlled by line commands.
pub struct HeadlessExplorer {
    session: StorySession,
    /// Transcript entries already printed.
    printed: usize,
}

impl HeadlessExplorer {
    pub fn new(session: StorySession) -> Self {
        Self {
            session,
            printed: 0,
        }
    }

    /// Print the archive and run the startup selection.
    pub async fn start(&mut self) -> HeadlessOutput {
        let mut text = self.catalog_listing();
        if self.session.start(Instant::now()).is_some() {
            self.session.wait_idle().await;
            text.push('\n');
            text.push_str(&self.drain_transcript());
        }
        HeadlessOutput::text(text)
    }

    pub async fn execute(&mut self, command: HeadlessCommand) -> HeadlessOutput {
        let now = Instant::now();
        match command {
            HeadlessCommand::Empty => HeadlessOutput::default(),
            HeadlessCommand::Select(key) => {
                let catalog = self.session.catalog();
                let order = display_order(catalog);
                let node = key
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| order.get(i).copied())
                    .or_else(|| find(catalog, &key));
                let Some(node) = node else {
                    return HeadlessOutput::text(format!("No story node matches '{key}'."));
                };
                self.session.select(node, now);
                self.session.wait_idle().await;
                HeadlessOutput::text(self.drain_transcript())
            }
            HeadlessCommand::List => HeadlessOutput::text(self.catalog_listing()),
            HeadlessCommand::View => {
                self.session.tick(now);
                HeadlessOutput::text(self.view_report())
            }
            HeadlessCommand::Slider(value) => {
                self.session.viewport_mut().set_slider(value);
                HeadlessOutput::text(format!("Reveal: {}%", self.session.viewport().slider()))
            }
            HeadlessCommand::Opacity(value) => {
                self.session.viewport_mut().set_opacity(value);
                HeadlessOutput::text(format!("Opacity: {}%", self.session.viewport().opacity()))
            }
            HeadlessCommand::Narrow(width) => {
                self.session.resize(width, now);
                HeadlessOutput::text(self.view_report())
            }
            HeadlessCommand::Mute => {
                let muted = self.session.toggle_mute();
                HeadlessOutput::text(if muted { "Audio muted." } else { "Audio on." })
            }
            HeadlessCommand::Save(path) => {
                let Some(uri) = self.session.transcript().latest_image().map(str::to_owned) else {
                    return HeadlessOutput::text("No illustration to save yet.");
                };
                match export_image(&uri, &path).await {
                    Ok(written) => HeadlessOutput::text(format!("Saved {}", written.display())),
                    Err(e) => HeadlessOutput::text(format!("Could not save image: {e}")),
                }
            }
            HeadlessCommand::Help => HeadlessOutput::text(HELP_TEXT),
            HeadlessCommand::Quit => HeadlessOutput {
                text: String::new(),
                quit: true,
            },
        }
    }

    pub fn session(&self) -> &StorySession {
        &self.session
    }

    fn catalog_listing(&self) -> String {
        let selected = self.session.selected().map(|n| n.id);
        let mut out = String::from("=== STORY ARCHIVE ===\n");
        let mut number = 1;
        for group in grouped(self.session.catalog()) {
            let _ = writeln!(out, "{}", group.category.to_uppercase());
            for node in group.nodes {
                let marker = if Some(node.id) == selected { '>' } else { ' ' };
                let _ = writeln!(
                    out,
                    "{marker} {number}. {} ({}) {:.2}",
                    node.title, node.id, node.coordinates
                );
                number += 1;
            }
        }
        out
    }

    fn view_report(&self) -> String {
        let state = self.session.viewport().state();
        format!(
            "LIVE FEED {:.5}  Z:{}{}\nReveal {}%  Opacity {}%{}\nSatellite:   {}\nIllustrated: {}",
            state.center,
            state.zoom,
            if state.narrow { " (narrow)" } else { "" },
            state.slider,
            state.opacity,
            if state.loading { "  [Calibrating Instruments]" } else { "" },
            state.urls.satellite,
            state.urls.illustrated,
        )
    }

    fn drain_transcript(&mut self) -> String {
        let entries = &self.session.transcript().entries()[self.printed..];
        let text = entries
            .iter()
            .map(format_entry)
            .collect::<Vec<_>>()
            .join("\n\n");
        self.printed = self.session.transcript().len();
        text
    }
}

/// Render one entry for plain-text output.
pub fn format_entry(entry: &TranscriptEntry) -> String {
    let speaker = match entry.role {
        Role::User => "EXPLORER",
        Role::Agent => "ARCHIVE",
    };
    let mut out = format!("[{speaker}] {}", entry.text);
    if let Some(uri) = entry.image_url.as_deref() {
        match DataUri::parse(uri) {
            Ok(data) => {
                let _ = write!(
                    out,
                    "\n[illustration: {}, {} KB]",
                    data.mime_type,
                    data.decoded_len().div_ceil(1024)
                );
            }
            Err(_) => out.push_str("\n[illustration]"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Scripted, TestHarness};

    #[test]
    fn test_parse_commands() {
        assert_eq!(HeadlessCommand::parse("  "), Ok(HeadlessCommand::Empty));
        assert_eq!(
            HeadlessCommand::parse("3"),
            Ok(HeadlessCommand::Select("3".into()))
        );
        assert_eq!(HeadlessCommand::parse("#list"), Ok(HeadlessCommand::List));
        assert_eq!(HeadlessCommand::parse("#slider 150"), Ok(HeadlessCommand::Slider(150)));
        assert_eq!(HeadlessCommand::parse("#opacity -10"), Ok(HeadlessCommand::Opacity(-10)));
        assert_eq!(HeadlessCommand::parse("#narrow 80"), Ok(HeadlessCommand::Narrow(80)));
        assert_eq!(
            HeadlessCommand::parse("#save out/ganesha.png"),
            Ok(HeadlessCommand::Save("out/ganesha.png".into()))
        );
        assert_eq!(HeadlessCommand::parse("#QUIT"), Ok(HeadlessCommand::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            HeadlessCommand::parse("#fly"),
            Err(CommandError::Unknown(_))
        ));
        assert!(matches!(
            HeadlessCommand::parse("#slider high"),
            Err(CommandError::BadArgument { .. })
        ));
        assert!(matches!(
            HeadlessCommand::parse("#save"),
            Err(CommandError::BadArgument { .. })
        ));
    }

    #[test]
    fn test_format_entry() {
        let entry = TranscriptEntry::agent("Tale", Some("data:image/png;base64,aGVsbG8=".into()));
        assert_eq!(
            format_entry(&entry),
            "[ARCHIVE] Tale\n[illustration: image/png, 1 KB]"
        );
        assert_eq!(format_entry(&TranscriptEntry::user("Hi")), "[EXPLORER] Hi");
    }

    #[tokio::test]
    async fn test_start_and_select_by_number() {
        let harness = TestHarness::new();
        harness.service.queue_text(Scripted::Ok("Ganesha tale".into()));
        let mut explorer = HeadlessExplorer::new(harness.session);

        let output = explorer.start().await;
        assert!(output.text.contains("VEDIC"));
        assert!(output.text.contains("> 1. Ganesha with Mouse"));
        assert!(output.text.contains("[ARCHIVE] Ganesha tale"));

        let output = explorer.execute(HeadlessCommand::Select("4".into())).await;
        assert!(output.text.starts_with("[EXPLORER] Retrieving Record: Pegasus"));
        assert!(!output.text.contains("Ganesha tale"));
        assert_eq!(explorer.session().selected().map(|n| n.id), Some("pegasus"));
    }

    #[tokio::test]
    async fn test_view_and_layer_controls() {
        let mut explorer = HeadlessExplorer::new(TestHarness::new().session);
        explorer.start().await;

        let output = explorer.execute(HeadlessCommand::Slider(150)).await;
        assert_eq!(output.text, "Reveal: 100%");
        let output = explorer.execute(HeadlessCommand::Opacity(-10)).await;
        assert_eq!(output.text, "Opacity: 0%");

        let output = explorer.execute(HeadlessCommand::Narrow(80)).await;
        assert!(output.text.contains("Z:7 (narrow)"));
        assert!(output.text.contains("&z=7"));
    }

    #[tokio::test]
    async fn test_unknown_selection_and_empty_save() {
        let mut explorer = HeadlessExplorer::new(TestHarness::new().session);
        let output = explorer.execute(HeadlessCommand::Select("kraken".into())).await;
        assert_eq!(output.text, "No story node matches 'kraken'.");

        let output = explorer.execute(HeadlessCommand::Save("x.png".into())).await;
        assert_eq!(output.text, "No illustration to save yet.");

        let output = explorer.execute(HeadlessCommand::Quit).await;
        assert!(output.quit);
    }
}
