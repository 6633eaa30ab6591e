//! Tracing subscriber setup.
//!
//! The TUI owns the terminal, so interactive runs log to a file. Headless
//! runs log to stderr, leaving stdout for the transcript.

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const LOG_FILE_VAR: &str = "STORYMAP_LOG_FILE";
const DEFAULT_LOG_FILE: &str = "storymap.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Log to the file named by `STORYMAP_LOG_FILE` (default `storymap.log`).
pub fn init_file() -> io::Result<PathBuf> {
    let path = std::env::var_os(LOG_FILE_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();

    Ok(path)
}

pub fn init_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .init();
}
