//! Dual-layer viewport widget
//!
//! Shows the two embed targets and a reveal strip: the illustrated layer
//! covers the left `slider`% of the strip, drawn denser as opacity rises.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

use storymap_core::ViewportState;

use crate::ui::theme::StoryTheme;

const SPINNER: [char; 4] = ['◐', '◓', '◑', '◒'];

/// Glyph for the illustrated layer at `opacity` percent.
pub fn overlay_glyph(opacity: u8) -> char {
    match opacity {
        0 => ' ',
        1..=33 => '░',
        34..=66 => '▒',
        _ => '▓',
    }
}

/// One row of the reveal strip.
pub fn reveal_strip(width: u16, slider: u8, opacity: u8) -> String {
    let width = usize::from(width);
    if width == 0 {
        return String::new();
    }
    let split = (width * usize::from(slider) + 50) / 100;
    let glyph = overlay_glyph(opacity);
    (0..width)
        .map(|i| match i.cmp(&split) {
            std::cmp::Ordering::Less => glyph,
            std::cmp::Ordering::Equal => '┃',
            std::cmp::Ordering::Greater => '·',
        })
        .collect()
}

pub struct ViewportWidget<'a> {
    state: &'a ViewportState,
    title: Option<&'a str>,
    theme: &'a StoryTheme,
    focused: bool,
    frame: u8,
}

impl<'a> ViewportWidget<'a> {
    pub fn new(state: &'a ViewportState, theme: &'a StoryTheme) -> Self {
        Self {
            state,
            title: None,
            theme,
            focused: false,
            frame: 0,
        }
    }

    pub fn title(mut self, title: Option<&'a str>) -> Self {
        self.title = title;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn frame(mut self, frame: u8) -> Self {
        self.frame = frame;
        self
    }
}

impl Widget for ViewportWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let heading = match self.title {
            Some(title) => format!(" Viewport: {title} "),
            None => " Viewport ".to_string(),
        };
        let block = Block::default()
            .title(Span::styled(heading, self.theme.title_style(self.focused)))
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.focused));

        let inner = block.inner(area);
        block.render(area, buf);

        let state = self.state;
        let dim = self.theme.system_style();
        let strip = reveal_strip(inner.width, state.slider, state.opacity);

        let mut lines = vec![
            Line::from(vec![
                Span::styled("● LIVE FEED ", self.theme.live_style()),
                Span::raw(format!("{:.5}", state.center)),
                Span::styled(
                    format!("  Z:{}{}", state.zoom, if state.narrow { " (narrow)" } else { "" }),
                    dim,
                ),
            ]),
            Line::from(""),
        ];

        let strip_rows = inner.height.saturating_sub(7).clamp(1, 4);
        for _ in 0..strip_rows {
            lines.push(Line::from(Span::styled(
                strip.clone(),
                Style::default().fg(self.theme.illustrated),
            )));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Layer Control ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(format!("Reveal {}%", state.slider), Style::default().fg(self.theme.illustrated)),
            Span::raw("  "),
            Span::styled(format!("Opacity {}%", state.opacity), Style::default().fg(self.theme.illustrated)),
        ]));
        lines.push(Line::from(vec![
            Span::styled("SAT ", Style::default().fg(self.theme.satellite)),
            Span::styled(state.urls.satellite.as_str(), dim),
        ]));
        lines.push(Line::from(vec![
            Span::styled("ART ", Style::default().fg(self.theme.illustrated)),
            Span::styled(state.urls.illustrated.as_str(), dim),
        ]));

        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .render(inner, buf);

        if state.loading && inner.height >= 3 && inner.width >= 28 {
            let spinner = SPINNER[usize::from(self.frame / 2) % SPINNER.len()];
            let text = format!(" {spinner} Calibrating Instruments ");
            let width = (text.chars().count() as u16).min(inner.width);
            let overlay = Rect::new(
                inner.x + (inner.width - width) / 2,
                inner.y + inner.height / 2,
                width,
                1,
            );
            Clear.render(overlay, buf);
            Paragraph::new(Span::styled(text, self.theme.category_style())).render(overlay, buf);
        }
    }
}
