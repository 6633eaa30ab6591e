//! Layout calculations for the story map TUI

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Wide layout: archive | viewport over comms
pub struct AppLayout {
    pub title_area: Rect,
    pub archive_area: Rect,
    pub viewport_area: Rect,
    pub comms_area: Rect,
    pub status_bar: Rect,
}

impl AppLayout {
    pub fn calculate(area: Rect) -> Self {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title bar
                Constraint::Min(10),   // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(34), Constraint::Min(40)])
            .split(main_chunks[1]);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(columns[1]);

        Self {
            title_area: main_chunks[0],
            archive_area: columns[0],
            viewport_area: right[0],
            comms_area: right[1],
            status_bar: main_chunks[2],
        }
    }
}

/// Narrow layout: one panel at a time with a tab bar
pub struct NarrowLayout {
    pub title_area: Rect,
    pub panel_area: Rect,
    pub tab_bar: Rect,
    pub status_bar: Rect,
}

impl NarrowLayout {
    pub fn calculate(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title bar
                Constraint::Min(6),    // Active panel
                Constraint::Length(1), // Tabs
                Constraint::Length(1), // Status bar
            ])
            .split(area);

        Self {
            title_area: chunks[0],
            panel_area: chunks[1],
            tab_bar: chunks[2],
            status_bar: chunks[3],
        }
    }
}

/// Calculate fixed-size centered popup
pub fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;

    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
