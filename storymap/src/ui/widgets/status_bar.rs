//! Status bar and narrow-layout tab bar

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use storymap_core::NarratorInit;

use crate::app::MobileTab;
use crate::ui::theme::StoryTheme;

/// Bottom line: uplink state, transient message and key hints
pub struct StatusBarWidget<'a> {
    narrator: NarratorInit,
    loading: bool,
    message: Option<&'a str>,
    theme: &'a StoryTheme,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(narrator: NarratorInit, theme: &'a StoryTheme) -> Self {
        Self {
            narrator,
            loading: false,
            message: None,
            theme,
        }
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    pub fn message(mut self, message: Option<&'a str>) -> Self {
        self.message = message;
        self
    }
}

impl Widget for StatusBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (uplink, uplink_style) = match self.narrator {
            NarratorInit::Ready => (
                " UPLINK ",
                Style::default().fg(Color::Black).bg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            NarratorInit::Unconfigured => (
                " NO KEY ",
                Style::default().fg(Color::White).bg(Color::Red).add_modifier(Modifier::BOLD),
            ),
        };

        let mut spans = vec![Span::styled(uplink, uplink_style), Span::raw(" ")];
        if self.loading {
            spans.push(Span::styled("Retrieving... ", self.theme.live_style()));
        }
        if let Some(message) = self.message {
            spans.push(Span::raw(message.to_string()));
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(
            "| ?:help q:quit Tab:focus m:mute s:save h/l:reveal [/]:opacity",
            self.theme.system_style(),
        ));

        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}

/// Tabs for the narrow layout
pub struct TabBarWidget<'a> {
    active: MobileTab,
    unread: bool,
    theme: &'a StoryTheme,
}

impl<'a> TabBarWidget<'a> {
    pub fn new(active: MobileTab, theme: &'a StoryTheme) -> Self {
        Self {
            active,
            unread: false,
            theme,
        }
    }

    pub fn unread(mut self, unread: bool) -> Self {
        self.unread = unread;
        self
    }
}

impl Widget for TabBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let tabs = [
            (MobileTab::Archive, "[a] Archive"),
            (MobileTab::Viewport, "[v] Viewport"),
            (MobileTab::Comms, "[c] Comms"),
        ];

        let mut spans = Vec::new();
        for (tab, label) in tabs {
            let style = if tab == self.active {
                self.theme.title_style(true).add_modifier(Modifier::REVERSED)
            } else {
                self.theme.title_style(false)
            };
            spans.push(Span::styled(format!(" {label} "), style));
            if tab == MobileTab::Comms && self.unread {
                spans.push(Span::styled("●", self.theme.live_style()));
            }
            spans.push(Span::raw(" "));
        }

        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}
