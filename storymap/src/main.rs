//! Story Map Explorer TUI application.
//!
//! A terminal interface for browsing geo-located myths while an AI narrator
//! retells each one and paints an illustration.
//!
//! # Headless Mode
//!
//! Run with `--headless` for a line-oriented interface suitable for scripting:
//!
//! ```bash
//! cargo run -p storymap -- --headless
//! ```

mod app;
mod events;
mod headless;
mod logging;
mod probe;
mod speech;
mod ui;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{
        self as term, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, stdout};
use std::time::{Duration, Instant};
use storymap_core::transcript::export_image;
use storymap_core::{StoryMapConfig, StorySession, STORY_NODES};
use tokio::sync::mpsc;

use app::App;
use events::{step, EventResult};
use probe::LayerProbe;
use speech::CommandSpeech;
use ui::render::render;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let config = StoryMapConfig::from_env()?;

    if args.iter().any(|a| a == "--headless") {
        logging::init_stderr();
        return headless::run_headless(config).await.map_err(|e| e.into());
    }

    let log_path = logging::init_file()?;
    tracing::info!(log = %log_path.display(), "starting story map explorer");
    if config.api_key.is_none() {
        tracing::warn!("no Gemini API key configured; the narrator is offline");
    }

    let speech = CommandSpeech::new(config.tts_command.clone());
    let session = StorySession::from_config(STORY_NODES, &config, Box::new(speech), Instant::now());
    let (probe_tx, probe_rx) = mpsc::unbounded_channel();
    let app = App::new(session).with_probe(LayerProbe::new(probe_tx), probe_rx);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;

    if let Err(e) = result {
        tracing::error!(error = %e, "terminal loop failed");
        eprintln!("Error: {e}");
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
) -> io::Result<()> {
    let (width, _) = term::size()?;
    app.start(width);

    loop {
        // Render
        terminal.draw(|f| render(f, &mut app))?;

        // Process any pending save operation
        if let Some(path) = app.pending_save.take() {
            let uri = app.session.transcript().latest_image().map(str::to_owned);
            if let Some(uri) = uri {
                match export_image(&uri, &path).await {
                    Ok(written) => app.set_status(format!("Saved {}", written.display())),
                    Err(e) => {
                        tracing::warn!(error = %e, "illustration export failed");
                        app.set_status(format!("Save failed: {e}"));
                    }
                }
            }
        }

        // Poll for events with timeout for animations
        let ev = if event::poll(Duration::from_millis(100))? {
            Some(event::read()?)
        } else {
            None
        };
        if step(&mut app, ev) == EventResult::Quit {
            return Ok(());
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn print_help() {
    println!("Story Map Explorer - AI-narrated map of world myths");
    println!();
    println!("USAGE:");
    println!("  storymap [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  -h, --help       Show this help message");
    println!("  --headless       Run in headless mode (text-only, no TUI)");
    println!();
    println!("ENVIRONMENT:");
    println!("  GEMINI_API_KEY          Gemini API key (API_KEY also accepted)");
    println!("  STORYMAP_TEXT_MODEL     Narrative model override");
    println!("  STORYMAP_IMAGE_MODEL    Illustration model override");
    println!("  STORYMAP_DATASET_ID     Illustrated map dataset id");
    println!("  STORYMAP_TTS_COMMAND    Text-to-speech program (default: espeak-ng)");
    println!("  STORYMAP_TTS_VOICE      Voice name passed to the TTS program");
    println!("  STORYMAP_NARROW_WIDTH   Columns below which the narrow layout is used");
    println!("  STORYMAP_LOG_FILE       Log file for the TUI (default: storymap.log)");
    println!("  RUST_LOG                Log filter (default: info)");
    println!();
    println!("EXAMPLES:");
    println!("  storymap                 # Interactive TUI mode");
    println!("  echo 4 | storymap --headless");
}
