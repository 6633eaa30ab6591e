//! Render orchestration for the story map TUI

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, MobileTab};
use crate::ui::layout::{centered_rect_fixed, AppLayout, NarrowLayout};
use crate::ui::widgets::{
    CatalogWidget, StatusBarWidget, TabBarWidget, TranscriptWidget, ViewportWidget,
};

/// Which panel is focused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusedPanel {
    #[default]
    Archive,
    Viewport,
    Comms,
}

/// Overlay types
#[derive(Debug, Clone)]
pub enum Overlay {
    Help,
}

/// Main render function
///
/// Takes `&mut App` because polling the speech engine for the audio
/// indicator reaps finished child processes.
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    if app.is_narrow() {
        render_narrow_layout(frame, app, area);
    } else {
        render_wide_layout(frame, app, area);
    }

    if let Some(Overlay::Help) = app.overlay() {
        render_help_overlay(frame, app, area);
    }
}

fn render_wide_layout(frame: &mut Frame, app: &mut App, area: Rect) {
    let layout = AppLayout::calculate(area);

    render_title_bar(frame, app, layout.title_area);
    render_archive(frame, app, layout.archive_area);
    render_viewport(frame, app, layout.viewport_area);
    render_comms(frame, app, layout.comms_area);
    render_status_bar(frame, app, layout.status_bar);
}

fn render_narrow_layout(frame: &mut Frame, app: &mut App, area: Rect) {
    let layout = NarrowLayout::calculate(area);

    render_title_bar(frame, app, layout.title_area);
    match app.mobile_tab {
        MobileTab::Archive => render_archive(frame, app, layout.panel_area),
        MobileTab::Viewport => render_viewport(frame, app, layout.panel_area),
        MobileTab::Comms => render_comms(frame, app, layout.panel_area),
    }

    let tabs = TabBarWidget::new(app.mobile_tab, &app.theme).unread(app.comms_unread());
    frame.render_widget(tabs, layout.tab_bar);
    render_status_bar(frame, app, layout.status_bar);
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.session.selected() {
        Some(node) => format!(" STORY MAP EXPLORER | {} | {} ", node.category, node.title),
        None => " STORY MAP EXPLORER ".to_string(),
    };

    let line = Line::from(Span::styled(
        title,
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ));
    frame.render_widget(Paragraph::new(line), area);
}

fn render_archive(frame: &mut Frame, app: &App, area: Rect) {
    let widget = CatalogWidget::new(app.session.catalog(), &app.theme)
        .selected(app.session.selected().map(|n| n.id))
        .cursor(app.cursor)
        .focused(matches!(app.focused_panel, FocusedPanel::Archive));
    frame.render_widget(widget, area);
}

fn render_viewport(frame: &mut Frame, app: &App, area: Rect) {
    let state = app.session.viewport().state();
    let widget = ViewportWidget::new(&state, &app.theme)
        .title(app.session.selected().map(|n| n.title))
        .focused(matches!(app.focused_panel, FocusedPanel::Viewport))
        .frame(app.animation_frame);
    frame.render_widget(widget, area);
}

fn render_comms(frame: &mut Frame, app: &mut App, area: Rect) {
    // Borders take one cell on each side.
    app.set_transcript_view(area.width.saturating_sub(2), area.height.saturating_sub(2));
    let audio = app.session.audio_status();
    let widget = TranscriptWidget::new(app.session.transcript().entries(), &app.theme)
        .scroll(app.transcript_scroll)
        .focused(matches!(app.focused_panel, FocusedPanel::Comms))
        .loading(app.session.is_loading())
        .audio(audio);
    frame.render_widget(widget, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let widget = StatusBarWidget::new(app.session.narrator_status(), &app.theme)
        .loading(app.session.is_loading())
        .message(app.status_message());
    frame.render_widget(widget, area);
}

fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect_fixed(52, 22, area);
    frame.render_widget(Clear, popup_area);

    let heading = |text: &'static str| {
        Line::from(Span::styled(
            text,
            Style::default().add_modifier(Modifier::UNDERLINED),
        ))
    };

    let help_text = vec![
        Line::from(Span::styled(
            " Story Map Explorer - Help ",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        heading("Archive:"),
        Line::from("  j/k or ↑/↓     Move cursor (Archive focus)"),
        Line::from("  Enter          Retrieve the record under cursor"),
        Line::from("  1-9            Retrieve record by number"),
        Line::from(""),
        heading("Viewport:"),
        Line::from("  h/l or ←/→     Reveal slider -/+"),
        Line::from("  [ / ]          Overlay opacity -/+"),
        Line::from(""),
        heading("Comms:"),
        Line::from("  j/k, PgUp/PgDn Scroll (Comms focus)"),
        Line::from("  G              Jump to newest and follow"),
        Line::from("  m              Mute / unmute read-aloud"),
        Line::from("  s              Save latest illustration"),
        Line::from(""),
        Line::from("  Tab            Cycle panel focus"),
        Line::from("  a / v / c      Switch tab (narrow display)"),
        Line::from("  q              Quit"),
        Line::from(Span::styled(
            "Press Esc or ? to close",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, popup_area);
}
