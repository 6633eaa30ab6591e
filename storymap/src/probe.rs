//! Load probe for the illustrated layer.
//!
//! A terminal cannot host the embed, so "the layer loaded" means the embed
//! URL answered successfully over HTTP.

use std::time::Duration;

use storymap_core::viewport::{Retarget, LOAD_TIMEOUT};
use tokio::sync::mpsc;
use tracing::debug;

/// Report of a successful load for one loading generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerLoaded {
    pub generation: u64,
}

#[derive(Clone)]
pub struct LayerProbe {
    client: reqwest::Client,
    tx: mpsc::UnboundedSender<LayerLoaded>,
}

impl LayerProbe {
    pub fn new(tx: mpsc::UnboundedSender<LayerLoaded>) -> Self {
        // Slower answers are already covered by the loading timeout.
        let client = reqwest::Client::builder()
            .timeout(LOAD_TIMEOUT + Duration::from_millis(500))
            .build()
            .unwrap_or_default();
        Self { client, tx }
    }

    /// Fetch the illustrated embed in the background.
    pub fn spawn(&self, retarget: Retarget) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let ok = match client.get(&retarget.illustrated_url).send().await {
                Ok(response) => response.status().is_success(),
                Err(e) => {
                    debug!(error = %e, "illustrated layer probe failed");
                    false
                }
            };
            if ok {
                let _ = tx.send(LayerLoaded {
                    generation: retarget.generation,
                });
            }
        });
    }
}
