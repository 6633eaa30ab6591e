//! UI module for the story map TUI

pub mod layout;
pub mod render;
pub mod theme;
pub mod widgets;

pub use render::{FocusedPanel, Overlay};
