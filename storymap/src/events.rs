//! Event handling for the story map TUI

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, MobileTab};
use crate::ui::FocusedPanel;

/// Result of handling an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    Quit,
    NeedsRedraw,
}

/// Handle a terminal event
pub fn handle_event(app: &mut App, event: Event) -> EventResult {
    match event {
        Event::Key(key) => handle_key_event(app, key),
        Event::Mouse(mouse) => handle_mouse_event(app, mouse),
        Event::Resize(width, _) => {
            app.resize(width);
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

/// Handle an event, if one arrived, then advance background work.
///
/// Ticks on every pass so a steady stream of input cannot starve
/// completions or the loading timeout.
pub fn step(app: &mut App, event: Option<Event>) -> EventResult {
    let result = match event {
        Some(event) => handle_event(app, event),
        None => EventResult::Continue,
    };
    app.tick();
    result
}

/// Handle a mouse event
fn handle_mouse_event(app: &mut App, mouse: MouseEvent) -> EventResult {
    match mouse.kind {
        MouseEventKind::ScrollUp => {
            app.scroll_up(3);
            EventResult::NeedsRedraw
        }
        MouseEventKind::ScrollDown => {
            app.scroll_down(3);
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

/// Handle a key event
fn handle_key_event(app: &mut App, key: KeyEvent) -> EventResult {
    if app.has_overlay() {
        return handle_overlay_key(app, key);
    }

    if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (key.code, key.modifiers) {
        return EventResult::Quit;
    }

    match key.code {
        KeyCode::Char('q') => EventResult::Quit,
        KeyCode::Char('?') | KeyCode::F(1) => {
            app.toggle_help();
            EventResult::NeedsRedraw
        }

        // Focus
        KeyCode::Tab => {
            app.cycle_focus();
            EventResult::NeedsRedraw
        }
        KeyCode::BackTab => {
            app.cycle_focus_reverse();
            EventResult::NeedsRedraw
        }

        // Narrow tabs
        KeyCode::Char('a') if app.is_narrow() => {
            app.set_tab(MobileTab::Archive);
            EventResult::NeedsRedraw
        }
        KeyCode::Char('v') if app.is_narrow() => {
            app.set_tab(MobileTab::Viewport);
            EventResult::NeedsRedraw
        }
        KeyCode::Char('c') if app.is_narrow() => {
            app.set_tab(MobileTab::Comms);
            EventResult::NeedsRedraw
        }

        // Selection
        KeyCode::Char(c @ '1'..='9') => {
            if let Some(number) = c.to_digit(10) {
                app.select_number(number as usize);
            }
            EventResult::NeedsRedraw
        }
        KeyCode::Enter => {
            app.select_at_cursor();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('j') | KeyCode::Down => {
            match app.focused_panel {
                FocusedPanel::Comms => app.scroll_down(1),
                _ => app.cursor_down(),
            }
            EventResult::NeedsRedraw
        }
        KeyCode::Char('k') | KeyCode::Up => {
            match app.focused_panel {
                FocusedPanel::Comms => app.scroll_up(1),
                _ => app.cursor_up(),
            }
            EventResult::NeedsRedraw
        }

        // Layer controls
        KeyCode::Char('h') | KeyCode::Left => {
            app.nudge_slider(-1);
            EventResult::NeedsRedraw
        }
        KeyCode::Char('l') | KeyCode::Right => {
            app.nudge_slider(1);
            EventResult::NeedsRedraw
        }
        KeyCode::Char('[') => {
            app.nudge_opacity(-1);
            EventResult::NeedsRedraw
        }
        KeyCode::Char(']') => {
            app.nudge_opacity(1);
            EventResult::NeedsRedraw
        }

        // Transcript
        KeyCode::Char('G') => {
            app.scroll_to_bottom();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('g') => {
            app.transcript_scroll = 0;
            app.scroll_locked_to_bottom = false;
            EventResult::NeedsRedraw
        }
        KeyCode::PageUp => {
            app.scroll_up(10);
            EventResult::NeedsRedraw
        }
        KeyCode::PageDown => {
            app.scroll_down(10);
            EventResult::NeedsRedraw
        }
        KeyCode::Char('m') => {
            app.toggle_mute();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('s') => {
            app.request_save();
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

/// Handle keys when an overlay is shown
fn handle_overlay_key(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
            app.close_overlay();
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}
