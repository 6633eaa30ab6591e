//! Dual-layer viewport: a satellite embed with an illustrated overlay.
//!
//! The viewport owns the target the two embeds are centred on, the reveal
//! slider that clips the illustrated layer, the overlay opacity, and a
//! loading gate that is armed on every re-target.

use std::time::{Duration, Instant};

use crate::catalog::{Coordinates, StoryNode};

/// Default artist map dataset.
pub const DEFAULT_DATASET_ID: &str = "1Vgo4n2MUqNzl8pZ_enSFpTm6S7BD-KxI";

/// Displays narrower than this many columns are treated as narrow.
pub const DEFAULT_NARROW_WIDTH: u16 = 100;

/// Zoom levels dropped on narrow displays.
pub const NARROW_ZOOM_OFFSET: f64 = 2.0;

/// Lowest zoom the narrow adjustment may produce.
pub const MIN_ZOOM: u32 = 2;

/// Loading is dismissed after this long even without a load signal.
pub const LOAD_TIMEOUT: Duration = Duration::from_secs(3);

/// Delay between the illustrated layer loading and the indicator clearing.
pub const LOAD_SETTLE: Duration = Duration::from_millis(500);

/// World view used when nothing is selected.
pub const WORLD_VIEW: Coordinates = Coordinates::new(20.0, 0.0);
pub const WORLD_ZOOM: f64 = 2.0;

/// Zoom substituted for a selected node with zoom 0.
pub const FALLBACK_ZOOM: f64 = 6.0;

const SATELLITE_BASE: &str = "https://maps.google.com/maps?t=k&output=embed";
const ILLUSTRATED_BASE: &str = "https://www.google.com/maps/d/embed";

/// Clamp an arbitrary percentage input into `0..=100`.
pub fn clamp_percent(value: i32) -> u8 {
    value.clamp(0, 100) as u8
}

/// Integer zoom sent to the embed provider.
///
/// Narrow displays drop [`NARROW_ZOOM_OFFSET`] levels, never going below
/// [`MIN_ZOOM`]. Fractional zooms are floored.
pub fn effective_zoom(zoom: f64, narrow: bool) -> u32 {
    let zoom = if zoom.is_finite() { zoom.max(0.0) } else { FALLBACK_ZOOM };
    if narrow {
        ((zoom - NARROW_ZOOM_OFFSET).floor().max(0.0) as u32).max(MIN_ZOOM)
    } else {
        zoom.floor() as u32
    }
}

/// The pair of embed URLs for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedUrls {
    pub satellite: String,
    pub illustrated: String,
}

impl EmbedUrls {
    pub fn new(dataset_id: &str, center: Coordinates, zoom: u32) -> Self {
        let (lat, lng) = (center.lat, center.lng);
        Self {
            satellite: format!("{SATELLITE_BASE}&q={lat},{lng}&z={zoom}"),
            illustrated: format!(
                "{ILLUSTRATED_BASE}?mid={dataset_id}&ehbc=2E312F&ll={lat},{lng}&z={zoom}"
            ),
        }
    }
}

/// Bounded loading indicator.
///
/// Each [`arm`](Self::arm) starts a new generation with a timeout deadline.
/// A load signal for the current generation pulls the deadline in to the
/// settle delay; whichever deadline comes first wins and the other is
/// discarded. Signals for older generations are ignored.
#[derive(Debug, Clone)]
pub struct LoadingGate {
    generation: u64,
    deadline: Option<Instant>,
    timeout: Duration,
    settle: Duration,
}

impl Default for LoadingGate {
    fn default() -> Self {
        Self::new(LOAD_TIMEOUT, LOAD_SETTLE)
    }
}

impl LoadingGate {
    pub fn new(timeout: Duration, settle: Duration) -> Self {
        Self {
            generation: 0,
            deadline: None,
            timeout,
            settle,
        }
    }

    /// Start loading; returns the generation a load signal must quote.
    pub fn arm(&mut self, now: Instant) -> u64 {
        self.generation += 1;
        self.deadline = Some(now + self.timeout);
        self.generation
    }

    /// Report that the illustrated layer finished loading.
    ///
    /// Returns false for stale or late signals.
    pub fn signal_loaded(&mut self, generation: u64, now: Instant) -> bool {
        if generation != self.generation {
            return false;
        }
        match self.deadline {
            Some(deadline) => {
                self.deadline = Some(deadline.min(now + self.settle));
                true
            }
            None => false,
        }
    }

    /// Advance time. Returns true when loading clears on this call.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Snapshot of everything the viewport renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportState {
    pub center: Coordinates,
    pub zoom: u32,
    pub narrow: bool,
    pub slider: u8,
    pub opacity: u8,
    pub loading: bool,
    pub urls: EmbedUrls,
}

/// Returned when the embeds were re-targeted and a load should be probed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retarget {
    pub generation: u64,
    pub illustrated_url: String,
}

/// The dual-layer viewport.
#[derive(Debug, Clone)]
pub struct Viewport {
    dataset_id: String,
    narrow_width: u16,
    width: Option<u16>,
    center: Coordinates,
    zoom: f64,
    slider: u8,
    opacity: u8,
    urls: EmbedUrls,
    gate: LoadingGate,
}

impl Viewport {
    /// Create a viewport framing the world view and start loading it.
    pub fn new(dataset_id: impl Into<String>, narrow_width: u16, now: Instant) -> Self {
        let dataset_id = dataset_id.into();
        let mut viewport = Self {
            urls: EmbedUrls::new(&dataset_id, WORLD_VIEW, effective_zoom(WORLD_ZOOM, false)),
            dataset_id,
            narrow_width,
            width: None,
            center: WORLD_VIEW,
            zoom: WORLD_ZOOM,
            slider: 50,
            opacity: 100,
            gate: LoadingGate::default(),
        };
        viewport.gate.arm(now);
        viewport
    }

    /// Centre on `node`, or on the world view when `None`.
    pub fn focus(&mut self, node: Option<&StoryNode>, now: Instant) -> Option<Retarget> {
        match node {
            Some(node) => self.retarget(Some(node.coordinates), Some(f64::from(node.zoom)), now),
            None => self.retarget(None, None, now),
        }
    }

    /// Move the target. Recomputes the URLs and re-arms loading only when
    /// the centre or zoom actually changed.
    pub fn retarget(
        &mut self,
        center: Option<Coordinates>,
        zoom: Option<f64>,
        now: Instant,
    ) -> Option<Retarget> {
        let (center, zoom) = match center {
            Some(center) => {
                let zoom = zoom.filter(|z| *z != 0.0).unwrap_or(FALLBACK_ZOOM);
                (center, zoom)
            }
            None => (WORLD_VIEW, WORLD_ZOOM),
        };

        if center == self.center && zoom == self.zoom {
            return None;
        }

        self.center = center;
        self.zoom = zoom;
        Some(self.rebuild(now))
    }

    /// Record the display width. Re-targets only when the width crosses
    /// the narrow breakpoint.
    pub fn resize(&mut self, width: u16, now: Instant) -> Option<Retarget> {
        let was_narrow = self.is_narrow();
        let first = self.width.is_none();
        self.width = Some(width);
        if self.is_narrow() != was_narrow || (first && self.is_narrow()) {
            Some(self.rebuild(now))
        } else {
            None
        }
    }

    fn rebuild(&mut self, now: Instant) -> Retarget {
        self.urls = EmbedUrls::new(&self.dataset_id, self.center, self.effective_zoom());
        let generation = self.gate.arm(now);
        Retarget {
            generation,
            illustrated_url: self.urls.illustrated.clone(),
        }
    }

    pub fn set_slider(&mut self, value: i32) {
        self.slider = clamp_percent(value);
    }

    pub fn nudge_slider(&mut self, delta: i32) {
        self.set_slider(i32::from(self.slider) + delta);
    }

    pub fn set_opacity(&mut self, value: i32) {
        self.opacity = clamp_percent(value);
    }

    pub fn nudge_opacity(&mut self, delta: i32) {
        self.set_opacity(i32::from(self.opacity) + delta);
    }

    /// The illustrated layer reported a load for `generation`.
    pub fn layer_loaded(&mut self, generation: u64, now: Instant) -> bool {
        self.gate.signal_loaded(generation, now)
    }

    /// Advance timers. Returns true when loading cleared.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.gate.poll(now)
    }

    pub fn is_narrow(&self) -> bool {
        self.width.is_some_and(|w| w < self.narrow_width)
    }

    pub fn effective_zoom(&self) -> u32 {
        effective_zoom(self.zoom, self.is_narrow())
    }

    pub fn center(&self) -> Coordinates {
        self.center
    }

    pub fn slider(&self) -> u8 {
        self.slider
    }

    pub fn opacity(&self) -> u8 {
        self.opacity
    }

    pub fn is_loading(&self) -> bool {
        self.gate.is_loading()
    }

    pub fn urls(&self) -> &EmbedUrls {
        &self.urls
    }

    pub fn state(&self) -> ViewportState {
        ViewportState {
            center: self.center,
            zoom: self.effective_zoom(),
            narrow: self.is_narrow(),
            slider: self.slider,
            opacity: self.opacity,
            loading: self.is_loading(),
            urls: self.urls.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::STORY_NODES;

    fn viewport(now: Instant) -> Viewport {
        Viewport::new(DEFAULT_DATASET_ID, DEFAULT_NARROW_WIDTH, now)
    }

    #[test]
    fn test_clamp_percent() {
        assert_eq!(clamp_percent(150), 100);
        assert_eq!(clamp_percent(-10), 0);
        assert_eq!(clamp_percent(42), 42);
    }

    #[test]
    fn test_effective_zoom() {
        assert_eq!(effective_zoom(9.0, false), 9);
        assert_eq!(effective_zoom(9.0, true), 7);
        assert_eq!(effective_zoom(3.0, true), 2);
        assert_eq!(effective_zoom(1.0, true), 2);
        assert_eq!(effective_zoom(5.7, false), 5);
        assert_eq!(effective_zoom(5.7, true), 3);
    }

    #[test]
    fn test_embed_urls() {
        let urls = EmbedUrls::new("abc", Coordinates::new(40.5, -14.25), 9);
        assert_eq!(
            urls.satellite,
            "https://maps.google.com/maps?t=k&output=embed&q=40.5,-14.25&z=9"
        );
        assert_eq!(
            urls.illustrated,
            "https://www.google.com/maps/d/embed?mid=abc&ehbc=2E312F&ll=40.5,-14.25&z=9"
        );
    }

    #[test]
    fn test_starts_on_world_view_loading() {
        let now = Instant::now();
        let vp = viewport(now);
        assert_eq!(vp.center(), WORLD_VIEW);
        assert_eq!(vp.effective_zoom(), 2);
        assert!(vp.is_loading());
        assert_eq!((vp.slider(), vp.opacity()), (50, 100));
    }

    #[test]
    fn test_focus_ganesha() {
        let now = Instant::now();
        let mut vp = viewport(now);
        let ganesha = &STORY_NODES[0];

        let retarget = vp.focus(Some(ganesha), now).unwrap();
        assert_eq!(retarget.illustrated_url, vp.urls().illustrated);
        assert!(vp.urls().satellite.contains("q=40.21730800117694,43.66722825233365"));
        assert!(vp.urls().satellite.ends_with("&z=9"));

        vp.resize(80, now).unwrap();
        assert!(vp.is_narrow());
        assert!(vp.urls().illustrated.ends_with("&z=7"));
    }

    #[test]
    fn test_same_target_does_not_rearm() {
        let now = Instant::now();
        let mut vp = viewport(now);
        let node = &STORY_NODES[2];
        assert!(vp.focus(Some(node), now).is_some());
        assert!(vp.focus(Some(node), now).is_none());
    }

    #[test]
    fn test_zero_zoom_falls_back() {
        let now = Instant::now();
        let mut vp = viewport(now);
        vp.retarget(Some(Coordinates::new(1.0, 2.0)), Some(0.0), now);
        assert_eq!(vp.effective_zoom(), 6);
        vp.retarget(Some(Coordinates::new(1.0, 2.0)), None, now);
        assert_eq!(vp.effective_zoom(), 6);
    }

    #[test]
    fn test_resize_only_rebuilds_across_breakpoint() {
        let now = Instant::now();
        let mut vp = viewport(now);
        vp.focus(Some(&STORY_NODES[0]), now);

        assert!(vp.resize(120, now).is_none());
        assert!(vp.resize(140, now).is_none());
        assert!(vp.resize(99, now).is_some());
        assert!(vp.resize(60, now).is_none());
        assert!(vp.resize(100, now).is_some());
        assert!(!vp.is_narrow());
    }

    #[test]
    fn test_first_resize_narrow_rebuilds() {
        let now = Instant::now();
        let mut vp = viewport(now);
        assert!(vp.resize(40, now).is_some());
    }

    #[test]
    fn test_slider_and_opacity_clamped() {
        let now = Instant::now();
        let mut vp = viewport(now);
        vp.set_slider(150);
        assert_eq!(vp.slider(), 100);
        vp.set_opacity(-10);
        assert_eq!(vp.opacity(), 0);
        vp.nudge_slider(-250);
        assert_eq!(vp.slider(), 0);
        vp.nudge_opacity(35);
        assert_eq!(vp.opacity(), 35);
    }

    #[test]
    fn test_loading_times_out() {
        let start = Instant::now();
        let mut vp = viewport(start);
        assert!(!vp.tick(start + Duration::from_millis(2999)));
        assert!(vp.is_loading());
        assert!(vp.tick(start + LOAD_TIMEOUT));
        assert!(!vp.is_loading());
        assert!(!vp.tick(start + Duration::from_secs(10)));
    }

    #[test]
    fn test_load_signal_settles_early() {
        let start = Instant::now();
        let mut vp = viewport(start);
        let retarget = vp.focus(Some(&STORY_NODES[0]), start).unwrap();

        let loaded_at = start + Duration::from_millis(200);
        assert!(vp.layer_loaded(retarget.generation, loaded_at));
        assert!(!vp.tick(loaded_at + Duration::from_millis(499)));
        assert!(vp.tick(loaded_at + LOAD_SETTLE));
    }

    #[test]
    fn test_late_load_signal_does_not_extend_timeout() {
        let start = Instant::now();
        let mut gate = LoadingGate::default();
        let generation = gate.arm(start);

        assert!(gate.signal_loaded(generation, start + Duration::from_millis(2900)));
        assert!(gate.poll(start + LOAD_TIMEOUT));
    }

    #[test]
    fn test_stale_load_signal_ignored() {
        let start = Instant::now();
        let mut vp = viewport(start);
        let first = vp.focus(Some(&STORY_NODES[0]), start).unwrap();
        let second = vp.focus(Some(&STORY_NODES[1]), start).unwrap();
        assert_ne!(first.generation, second.generation);

        assert!(!vp.layer_loaded(first.generation, start));
        assert!(!vp.tick(start + Duration::from_secs(1)));
        assert!(vp.is_loading());
    }

    #[test]
    fn test_rearm_resets_deadline() {
        let start = Instant::now();
        let mut vp = viewport(start);
        let later = start + Duration::from_secs(2);
        vp.focus(Some(&STORY_NODES[3]), later);
        assert!(!vp.tick(start + LOAD_TIMEOUT));
        assert!(vp.tick(later + LOAD_TIMEOUT));
    }
}
