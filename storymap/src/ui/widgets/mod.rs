//! TUI widgets for the story map

pub mod catalog;
pub mod status_bar;
pub mod transcript;
pub mod viewport;

pub use catalog::CatalogWidget;
pub use status_bar::{StatusBarWidget, TabBarWidget};
pub use transcript::TranscriptWidget;
pub use viewport::ViewportWidget;
