//! Headless mode for the story map.
//!
//! A line-oriented front end over stdin/stdout for scripted runs and agents.
//! Commands are parsed by [`HeadlessCommand`]; everything printed is plain text.

use std::io::{self, BufRead, Write};
use std::time::Instant;

use storymap_core::headless::HELP_TEXT;
use storymap_core::{
    HeadlessCommand, HeadlessExplorer, NarratorInit, StoryMapConfig, StorySession, STORY_NODES,
};

use crate::speech::CommandSpeech;

/// Run the explorer in headless mode until `#quit` or end of input.
pub async fn run_headless(config: StoryMapConfig) -> io::Result<()> {
    let speech = CommandSpeech::new(config.tts_command.clone());
    let session = StorySession::from_config(STORY_NODES, &config, Box::new(speech), Instant::now());
    let mut explorer = HeadlessExplorer::new(session);

    println!("=== Story Map Headless Mode ===");
    match explorer.session().narrator_status() {
        NarratorInit::Ready => println!("Narrator: online"),
        NarratorInit::Unconfigured => println!("Narrator: offline (no API key; stories will not be generated)"),
    }
    println!();
    println!("{HELP_TEXT}");
    println!();

    let start = explorer.start().await;
    println!("{}", start.text);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        };

        let command = match HeadlessCommand::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("[ERROR] {e}. Type #help for help.");
                stdout.flush()?;
                continue;
            }
        };

        let output = explorer.execute(command).await;
        if !output.text.is_empty() {
            println!("{}", output.text);
        }
        stdout.flush()?;

        if output.quit {
            println!("Goodbye!");
            break;
        }
    }

    Ok(())
}
