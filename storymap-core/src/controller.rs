//! Root controller: selection, transcript and loading state.
//!
//! A selection is split in two halves so the UI loop never blocks:
//! [`StoryController::begin`] records the request synchronously and
//! [`StoryController::settle`] applies the outcome once the orchestration
//! task reports back through [`dispatch`].

use std::fmt::Display;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::catalog::StoryNode;
use crate::narrator::{AgentResponse, Narrator};
use crate::transcript::{Transcript, TranscriptEntry};

pub const ARCHIVE_ERROR: &str = "Error accessing the Archive. Please verify API connection.";

/// Text of the user entry appended on selection.
pub fn retrieval_message(node: &StoryNode) -> String {
    format!(
        "Retrieving Record: {} \nCoordinates: [{:.4}, {:.4}]",
        node.title, node.coordinates.lat, node.coordinates.lng
    )
}

/// A selection waiting for its orchestration result.
#[derive(Debug, Clone)]
pub struct PendingStory {
    pub ticket: u64,
    pub node: StoryNode,
}

/// Result delivered back to the UI loop.
#[derive(Debug)]
pub struct StoryCompletion {
    pub ticket: u64,
    pub outcome: Result<AgentResponse, String>,
}

/// Owns the selected node, the transcript and the in-flight count.
#[derive(Debug)]
pub struct StoryController {
    catalog: &'static [StoryNode],
    selected: Option<StoryNode>,
    transcript: Transcript,
    in_flight: usize,
    next_ticket: u64,
}

impl StoryController {
    pub fn new(catalog: &'static [StoryNode]) -> Self {
        Self {
            catalog,
            selected: None,
            transcript: Transcript::new(),
            in_flight: 0,
            next_ticket: 0,
        }
    }

    pub fn catalog(&self) -> &'static [StoryNode] {
        self.catalog
    }

    /// The node selected at startup, if the catalog has one.
    pub fn startup_selection(&self) -> Option<&'static StoryNode> {
        self.catalog.first()
    }

    /// Record a selection: update `selected`, append the user entry and
    /// mark loading.
    pub fn begin(&mut self, node: &StoryNode) -> PendingStory {
        info!(node = node.id, "node selected");
        self.selected = Some(node.clone());
        self.transcript.push(TranscriptEntry::user(retrieval_message(node)));
        self.in_flight += 1;
        self.next_ticket += 1;
        PendingStory {
            ticket: self.next_ticket,
            node: node.clone(),
        }
    }

    /// Apply the outcome of an orchestration and drop its loading claim.
    pub fn settle<E: Display>(&mut self, ticket: u64, outcome: Result<AgentResponse, E>) {
        match outcome {
            Ok(response) => {
                self.transcript
                    .push(TranscriptEntry::agent(response.text, response.image_url));
            }
            Err(e) => {
                warn!(ticket, error = %e, "orchestration failed");
                self.transcript.push(TranscriptEntry::agent(ARCHIVE_ERROR, None));
            }
        }
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Run one selection to completion on the current task.
    pub async fn select(&mut self, narrator: &Narrator, node: &StoryNode) {
        let pending = self.begin(node);
        let response = narrator.generate_story_response(&pending.node).await;
        self.settle::<String>(pending.ticket, Ok(response));
    }

    pub fn selected(&self) -> Option<&StoryNode> {
        self.selected.as_ref()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

/// Spawn the orchestration for `pending`; the completion is sent on `tx`.
///
/// A panicked or aborted task is reported as a failure.
pub fn dispatch(
    narrator: Narrator,
    pending: PendingStory,
    tx: mpsc::UnboundedSender<StoryCompletion>,
) {
    let ticket = pending.ticket;
    let task = tokio::spawn(async move { narrator.generate_story_response(&pending.node).await });

    tokio::spawn(async move {
        let outcome = task.await.map_err(|e| e.to_string());
        // The receiver is gone only during shutdown.
        let _ = tx.send(StoryCompletion { ticket, outcome });
    });
}
