//! Conversation transcript widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::scrollbar,
    text::{Line, Span},
    widgets::{
        Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
        StatefulWidget, Widget,
    },
};

use storymap_core::transcript::{DataUri, Role};
use storymap_core::{AudioStatus, TranscriptEntry};

use crate::ui::theme::StoryTheme;

/// Columns available to text inside a panel of `inner_width`; the last
/// column belongs to the scrollbar.
pub fn text_width(inner_width: u16) -> usize {
    usize::from(inner_width.saturating_sub(1)).max(1)
}

/// Word-wrap `text` into rows of at most `width` characters.
///
/// Words longer than a row are split. Spaces are kept, so an empty or
/// all-space line still yields one row.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut row = String::new();
    let mut row_len = 0;

    for word in text.split(' ') {
        let len = word.chars().count();
        if row_len > 0 && row_len + 1 + len > width {
            rows.push(std::mem::take(&mut row));
            row_len = 0;
        }
        if row_len > 0 {
            row.push(' ');
            row_len += 1;
        }
        for ch in word.chars() {
            if row_len == width {
                rows.push(std::mem::take(&mut row));
                row_len = 0;
            }
            row.push(ch);
            row_len += 1;
        }
    }
    rows.push(row);
    rows
}

/// Widget for the user/agent transcript
pub struct TranscriptWidget<'a> {
    entries: &'a [TranscriptEntry],
    scroll: usize,
    theme: &'a StoryTheme,
    focused: bool,
    loading: bool,
    audio: AudioStatus,
}

impl<'a> TranscriptWidget<'a> {
    pub fn new(entries: &'a [TranscriptEntry], theme: &'a StoryTheme) -> Self {
        Self {
            entries,
            scroll: 0,
            theme,
            focused: false,
            loading: false,
            audio: AudioStatus::On,
        }
    }

    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    pub fn audio(mut self, audio: AudioStatus) -> Self {
        self.audio = audio;
        self
    }

    /// Rendered rows, wrapped to `width` columns.
    pub fn lines(&self, width: usize) -> Vec<Line<'a>> {
        let mut lines: Vec<Line> = Vec::new();
        let mut push = |text: &str, style: Style| {
            for row in wrap_text(text, width) {
                lines.push(Line::from(Span::styled(row, style)));
            }
        };

        for entry in self.entries {
            let (prefix, style) = match entry.role {
                Role::User => ("> ", self.theme.user_style()),
                Role::Agent => ("", self.theme.agent_style()),
            };

            for (i, line) in entry.text.lines().enumerate() {
                let prefix = if i == 0 { prefix } else { "  " };
                push(&format!("{prefix}{line}"), style);
            }

            if let Some(uri) = entry.image_url.as_deref() {
                let label = match DataUri::parse(uri) {
                    Ok(data) => format!(
                        "[illustration: {}, {} KB - s to save]",
                        data.mime_type,
                        data.decoded_len().div_ceil(1024)
                    ),
                    Err(_) => "[illustration]".to_string(),
                };
                push(&label, Style::default().fg(self.theme.illustrated));
            }

            push("", Style::default());
        }

        if self.loading {
            push(
                "Accessing Cultural Database...",
                self.theme.system_style().add_modifier(Modifier::ITALIC),
            );
        }

        lines
    }
}

impl Widget for TranscriptWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let audio_style = match self.audio {
            AudioStatus::Muted => self.theme.system_style(),
            AudioStatus::Speaking => self.theme.live_style(),
            AudioStatus::On => Style::default().fg(self.theme.satellite),
        };
        let title = Line::from(vec![
            Span::styled(
                if self.focused { " Comms [j/k G] " } else { " Comms " },
                self.theme.title_style(self.focused),
            ),
            Span::styled(format!("{} ", self.audio.label()), audio_style),
        ]);

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.focused));

        let inner = block.inner(area);
        block.render(area, buf);

        let lines = self.lines(text_width(inner.width));
        let visible_height = inner.height as usize;
        let total_lines = lines.len();
        let max_scroll = total_lines.saturating_sub(visible_height);
        let scroll = self.scroll.min(max_scroll);

        Paragraph::new(lines)
            .scroll((scroll.min(usize::from(u16::MAX)) as u16, 0))
            .render(inner, buf);

        if total_lines > visible_height {
            let scrollbar_area = Rect {
                x: inner.x + inner.width.saturating_sub(1),
                y: inner.y,
                width: 1,
                height: inner.height,
            };

            let mut scrollbar_state = ScrollbarState::new(max_scroll).position(scroll);
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .symbols(scrollbar::VERTICAL)
                .thumb_style(Style::default().fg(Color::DarkGray))
                .track_style(Style::default().fg(Color::Black))
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"))
                .render(scrollbar_area, buf, &mut scrollbar_state);

            if scroll < max_scroll {
                let hint = format!(" ↓{} more ", max_scroll - scroll);
                let hint_y = inner.y + inner.height.saturating_sub(1);
                let hint_style = Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM);
                for (i, ch) in hint.chars().enumerate() {
                    let x = inner.x + i as u16;
                    if x < inner.x + inner.width.saturating_sub(2) {
                        buf[(x, hint_y)].set_char(ch).set_style(hint_style);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_for_entries() {
        let theme = StoryTheme::default();
        let entries = vec![
            TranscriptEntry::user("Retrieving Record: Pegasus \nCoordinates: [40.0117, -14.3033]"),
            TranscriptEntry::agent("The winged horse.", Some("data:image/png;base64,aGVsbG8=".into())),
        ];
        let widget = TranscriptWidget::new(&entries, &theme).loading(true);
        let text: Vec<String> = widget.lines(80).iter().map(|l| l.to_string()).collect();

        assert_eq!(text[0], "> Retrieving Record: Pegasus ");
        assert_eq!(text[1], "  Coordinates: [40.0117, -14.3033]");
        assert_eq!(text[3], "The winged horse.");
        assert_eq!(text[4], "[illustration: image/png, 1 KB - s to save]");
        assert_eq!(text.last().unwrap(), "Accessing Cultural Database...");
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap_text("", 10), vec![""]);
        assert_eq!(wrap_text("tail ", 10), vec!["tail "]);
    }

    #[test]
    fn test_bottom_scroll_shows_end_of_long_reply() {
        let theme = StoryTheme::default();
        let mut reply = "word ".repeat(149);
        reply.push_str("FINAL_WORD");
        let entries = vec![
            TranscriptEntry::user("Retrieving Record: Pegasus"),
            TranscriptEntry::agent(reply, None),
        ];

        let area = Rect::new(0, 0, 42, 12);
        let mut buf = Buffer::empty(area);
        TranscriptWidget::new(&entries, &theme)
            .scroll(usize::MAX / 2)
            .render(area, &mut buf);

        let screen: String = (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n");
        assert!(screen.contains("FINAL_WORD"), "newest text not visible:\n{screen}");
    }
}
