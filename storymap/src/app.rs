//! Main application state and logic

use std::path::PathBuf;
use std::time::Instant;

use storymap_core::catalog::display_order;
use storymap_core::viewport::Retarget;
use storymap_core::{StoryNode, StorySession};
use tokio::sync::mpsc;

use crate::probe::{LayerLoaded, LayerProbe};
use crate::ui::theme::StoryTheme;
use crate::ui::widgets::transcript::{text_width, TranscriptWidget};
use crate::ui::{FocusedPanel, Overlay};

/// Panel shown on narrow displays, where only one fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MobileTab {
    Archive,
    #[default]
    Viewport,
    Comms,
}

const SLIDER_STEP: i32 = 5;
const OPACITY_STEP: i32 = 10;

/// Main application state
pub struct App {
    pub session: StorySession,

    // Illustrated layer load reports
    probe: Option<LayerProbe>,
    probe_rx: Option<mpsc::UnboundedReceiver<LayerLoaded>>,

    // UI state
    pub theme: StoryTheme,
    pub focused_panel: FocusedPanel,
    pub mobile_tab: MobileTab,
    overlay: Option<Overlay>,

    // Selection panel
    pub cursor: usize,

    // Transcript display
    pub transcript_scroll: usize,
    pub scroll_locked_to_bottom: bool,
    transcript_view: (u16, u16),
    seen_entries: usize,
    last_loading: bool,

    // Status
    status_message: Option<String>,
    pub should_quit: bool,
    pub pending_save: Option<PathBuf>,

    // Animation
    pub animation_frame: u8,
}

impl App {
    pub fn new(session: StorySession) -> Self {
        Self {
            session,
            probe: None,
            probe_rx: None,
            theme: StoryTheme::default(),
            focused_panel: FocusedPanel::default(),
            mobile_tab: MobileTab::default(),
            overlay: None,
            cursor: 0,
            transcript_scroll: 0,
            scroll_locked_to_bottom: true,
            transcript_view: (0, 0),
            seen_entries: 0,
            last_loading: false,
            status_message: None,
            should_quit: false,
            pending_save: None,
            animation_frame: 0,
        }
    }

    /// Probe the illustrated layer over HTTP after every re-target.
    pub fn with_probe(mut self, probe: LayerProbe, rx: mpsc::UnboundedReceiver<LayerLoaded>) -> Self {
        self.probe = Some(probe);
        self.probe_rx = Some(rx);
        self
    }

    /// Run the startup selection.
    pub fn start(&mut self, width: u16) {
        let now = Instant::now();
        let resized = self.session.resize(width, now);
        let started = self.session.start(now).and_then(|s| s.retarget);
        // Only the latest generation can clear loading.
        if let Some(retarget) = started.or(resized) {
            self.spawn_probe(retarget);
        }
    }

    /// Nodes in the order the selection panel lists them.
    pub fn nodes(&self) -> Vec<&'static StoryNode> {
        display_order(self.session.catalog())
    }

    pub fn is_narrow(&self) -> bool {
        self.session.viewport().is_narrow()
    }

    // ========================================================================
    // Selection
    // ========================================================================

    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_down(&mut self) {
        let last = self.nodes().len().saturating_sub(1);
        self.cursor = (self.cursor + 1).min(last);
    }

    pub fn select_at_cursor(&mut self) {
        if let Some(node) = self.nodes().get(self.cursor).copied() {
            self.select(node);
        }
    }

    /// Select by 1-based display number.
    pub fn select_number(&mut self, number: usize) {
        let Some(index) = number.checked_sub(1) else {
            return;
        };
        if let Some(node) = self.nodes().get(index).copied() {
            self.cursor = index;
            self.select(node);
        }
    }

    fn select(&mut self, node: &StoryNode) {
        let selection = self.session.select(node, Instant::now());
        if let Some(retarget) = selection.retarget {
            self.spawn_probe(retarget);
        }
        if self.is_narrow() {
            self.mobile_tab = MobileTab::Viewport;
        }
        self.set_status(format!("Retrieving {}", node.title));
    }

    fn spawn_probe(&self, retarget: Retarget) {
        if let Some(probe) = &self.probe {
            probe.spawn(retarget);
        }
    }

    // ========================================================================
    // Viewport
    // ========================================================================

    pub fn nudge_slider(&mut self, direction: i32) {
        self.session.viewport_mut().nudge_slider(direction * SLIDER_STEP);
    }

    pub fn nudge_opacity(&mut self, direction: i32) {
        self.session.viewport_mut().nudge_opacity(direction * OPACITY_STEP);
    }

    pub fn resize(&mut self, width: u16) {
        if let Some(retarget) = self.session.resize(width, Instant::now()) {
            self.spawn_probe(retarget);
        }
    }

    // ========================================================================
    // Conversation
    // ========================================================================

    pub fn toggle_mute(&mut self) {
        let muted = self.session.toggle_mute();
        self.set_status(if muted { "Audio muted" } else { "Audio on" });
    }

    /// Queue the newest illustration for saving.
    pub fn request_save(&mut self) {
        if self.session.transcript().latest_image().is_none() {
            self.set_status("No illustration to save yet");
            return;
        }
        let title = self
            .session
            .selected()
            .map(|n| n.id)
            .unwrap_or("illustration");
        self.pending_save = Some(PathBuf::from(title));
    }

    /// Scroll transcript to bottom and lock to bottom
    pub fn scroll_to_bottom(&mut self) {
        // The widget caps this to the real maximum.
        self.transcript_scroll = usize::MAX / 2;
        self.scroll_locked_to_bottom = true;
    }

    /// Record the inner size of the comms panel from the last render.
    pub fn set_transcript_view(&mut self, width: u16, height: u16) {
        self.transcript_view = (width, height);
    }

    /// Scroll offset that shows the newest row, using the same wrapping
    /// the transcript widget renders with.
    fn max_scroll(&self) -> usize {
        let (width, height) = self.transcript_view;
        let rows = TranscriptWidget::new(self.session.transcript().entries(), &self.theme)
            .loading(self.session.is_loading())
            .lines(text_width(width))
            .len();
        rows.saturating_sub(usize::from(height))
    }

    pub fn scroll_up(&mut self, lines: usize) {
        let max_scroll = self.max_scroll();
        if self.transcript_scroll > max_scroll {
            self.transcript_scroll = max_scroll;
        }
        self.transcript_scroll = self.transcript_scroll.saturating_sub(lines);
        self.scroll_locked_to_bottom = false;
    }

    pub fn scroll_down(&mut self, lines: usize) {
        let max_scroll = self.max_scroll();
        self.transcript_scroll = self.transcript_scroll.saturating_add(lines).min(max_scroll);
        if self.transcript_scroll == max_scroll {
            self.scroll_locked_to_bottom = true;
        }
    }

    /// The comms tab has entries the user has not looked at.
    pub fn comms_unread(&self) -> bool {
        self.mobile_tab != MobileTab::Comms && !self.session.transcript().is_empty()
    }

    pub fn set_tab(&mut self, tab: MobileTab) {
        self.mobile_tab = tab;
        self.focused_panel = match tab {
            MobileTab::Archive => FocusedPanel::Archive,
            MobileTab::Viewport => FocusedPanel::Viewport,
            MobileTab::Comms => FocusedPanel::Comms,
        };
    }

    pub fn cycle_focus(&mut self) {
        self.focused_panel = match self.focused_panel {
            FocusedPanel::Archive => FocusedPanel::Viewport,
            FocusedPanel::Viewport => FocusedPanel::Comms,
            FocusedPanel::Comms => FocusedPanel::Archive,
        };
    }

    pub fn cycle_focus_reverse(&mut self) {
        self.focused_panel = match self.focused_panel {
            FocusedPanel::Archive => FocusedPanel::Comms,
            FocusedPanel::Viewport => FocusedPanel::Archive,
            FocusedPanel::Comms => FocusedPanel::Viewport,
        };
    }

    // ========================================================================
    // Overlay and status
    // ========================================================================

    pub fn toggle_help(&mut self) {
        if matches!(self.overlay, Some(Overlay::Help)) {
            self.overlay = None;
        } else {
            self.overlay = Some(Overlay::Help);
        }
    }

    pub fn close_overlay(&mut self) {
        self.overlay = None;
    }

    pub fn has_overlay(&self) -> bool {
        self.overlay.is_some()
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    // ========================================================================
    // Background work
    // ========================================================================

    /// Apply arrived results and advance timers.
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.animation_frame = self.animation_frame.wrapping_add(1);

        self.session.pump();

        if let Some(rx) = self.probe_rx.as_mut() {
            while let Ok(loaded) = rx.try_recv() {
                self.session.viewport_loaded(loaded.generation, now);
            }
        }
        self.session.tick(now);

        let len = self.session.transcript().len();
        let loading = self.session.is_loading();
        if (len != self.seen_entries || loading != self.last_loading) && self.scroll_locked_to_bottom {
            self.scroll_to_bottom();
        }
        self.seen_entries = len;
        self.last_loading = loading;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storymap_core::TestHarness;

    fn app() -> App {
        App::new(TestHarness::new().session)
    }

    #[tokio::test]
    async fn test_start_selects_first_node() {
        let mut app = app();
        app.start(160);
        assert_eq!(app.session.selected().map(|n| n.id), Some("ganesha-mouse"));
        assert!(!app.is_narrow());

        app.session.wait_idle().await;
        app.tick();
        assert_eq!(app.session.transcript().len(), 2);
        assert!(app.scroll_locked_to_bottom);
    }

    #[tokio::test]
    async fn test_narrow_selection_jumps_to_viewport() {
        let mut app = app();
        app.start(60);
        app.set_tab(MobileTab::Archive);

        app.select_number(4);
        assert_eq!(app.mobile_tab, MobileTab::Viewport);
        assert_eq!(app.cursor, 3);
        assert_eq!(app.session.selected().map(|n| n.id), Some("pegasus"));
        assert!(app.comms_unread());

        app.set_tab(MobileTab::Comms);
        assert!(!app.comms_unread());
    }

    #[tokio::test]
    async fn test_cursor_bounds() {
        let mut app = app();
        app.cursor_up();
        assert_eq!(app.cursor, 0);
        for _ in 0..20 {
            app.cursor_down();
        }
        assert_eq!(app.cursor, app.nodes().len() - 1);

        app.select_number(0);
        app.select_number(99);
        assert!(app.session.selected().is_none());
    }

    #[tokio::test]
    async fn test_layer_controls_step_and_clamp() {
        let mut app = app();
        app.nudge_slider(1);
        assert_eq!(app.session.viewport().slider(), 55);
        app.nudge_opacity(1);
        assert_eq!(app.session.viewport().opacity(), 100);
        for _ in 0..30 {
            app.nudge_slider(-1);
        }
        assert_eq!(app.session.viewport().slider(), 0);
    }

    #[tokio::test]
    async fn test_scroll_unlocks_and_g_relocks() {
        let mut app = app();
        app.scroll_up(1);
        assert!(!app.scroll_locked_to_bottom);
        app.scroll_to_bottom();
        assert!(app.scroll_locked_to_bottom);
    }

    #[tokio::test]
    async fn test_scroll_limits_follow_wrapped_rows() {
        let mut harness = TestHarness::new();
        harness.expect_text("word ".repeat(200));
        harness.select("pegasus").await;
        let mut app = App::new(harness.session);
        app.set_transcript_view(40, 10);

        app.scroll_to_bottom();
        app.scroll_up(1);
        let max = app.max_scroll();
        assert!(max > 20, "a long reply wraps into many rows");
        assert_eq!(app.transcript_scroll, max - 1);

        app.scroll_down(5);
        assert_eq!(app.transcript_scroll, max);
        assert!(app.scroll_locked_to_bottom);
    }

    #[tokio::test]
    async fn test_save_without_image() {
        let mut app = app();
        app.request_save();
        assert!(app.pending_save.is_none());
        assert_eq!(app.status_message(), Some("No illustration to save yet"));
    }
}
