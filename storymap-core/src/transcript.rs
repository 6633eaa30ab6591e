//! The running user/agent transcript and the images attached to it.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Agent,
}

/// One entry in the transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub role: Role,
    pub text: String,
    /// Illustration as a `data:` URI.
    pub image_url: Option<String>,
}

impl TranscriptEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            image_url: None,
        }
    }

    pub fn agent(text: impl Into<String>, image_url: Option<String>) -> Self {
        Self {
            role: Role::Agent,
            text: text.into(),
            image_url,
        }
    }

    pub fn is_agent(&self) -> bool {
        self.role == Role::Agent
    }
}

/// Append-only, ordered sequence of entries.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recent illustration, if any entry carries one.
    pub fn latest_image(&self) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find_map(|e| e.image_url.as_deref())
    }
}

/// Errors from decoding or exporting an attached image.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("not a base64 data URI")]
    NotDataUri,

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A parsed `data:{mime};base64,{payload}` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri<'a> {
    pub mime_type: &'a str,
    pub payload: &'a str,
}

impl<'a> DataUri<'a> {
    pub fn parse(uri: &'a str) -> Result<Self, ImageError> {
        let rest = uri.strip_prefix("data:").ok_or(ImageError::NotDataUri)?;
        let (header, payload) = rest.split_once(',').ok_or(ImageError::NotDataUri)?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or(ImageError::NotDataUri)?;
        if mime_type.is_empty() || payload.is_empty() {
            return Err(ImageError::NotDataUri);
        }
        Ok(Self { mime_type, payload })
    }

    pub fn decode(&self) -> Result<Vec<u8>, ImageError> {
        Ok(STANDARD.decode(self.payload)?)
    }

    /// Size of the decoded payload without decoding it.
    pub fn decoded_len(&self) -> usize {
        let padding = self.payload.bytes().rev().take_while(|b| *b == b'=').count();
        (self.payload.len() / 4 * 3).saturating_sub(padding)
    }

    /// File extension matching the MIME type.
    pub fn extension(&self) -> &'static str {
        match self.mime_type {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }
}

/// Decode `uri` and write the image to `path`.
///
/// A path without an extension gets one from the MIME type. Returns the
/// path actually written.
pub async fn export_image(uri: &str, path: impl AsRef<Path>) -> Result<PathBuf, ImageError> {
    let data_uri = DataUri::parse(uri)?;
    let bytes = data_uri.decode()?;

    let mut path = path.as_ref().to_path_buf();
    if path.extension().is_none() {
        path.set_extension(data_uri.extension());
    }

    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}
