//! Archive (selection panel) widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use storymap_core::catalog::grouped;
use storymap_core::StoryNode;

use crate::ui::theme::StoryTheme;

/// Catalog grouped by category, numbered in display order
pub struct CatalogWidget<'a> {
    nodes: &'a [StoryNode],
    selected: Option<&'a str>,
    cursor: usize,
    theme: &'a StoryTheme,
    focused: bool,
}

impl<'a> CatalogWidget<'a> {
    pub fn new(nodes: &'a [StoryNode], theme: &'a StoryTheme) -> Self {
        Self {
            nodes,
            selected: None,
            cursor: 0,
            theme,
            focused: false,
        }
    }

    pub fn selected(mut self, id: Option<&'a str>) -> Self {
        self.selected = id;
        self
    }

    pub fn cursor(mut self, cursor: usize) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    fn lines(&self) -> Vec<Line<'a>> {
        let mut lines = Vec::new();
        let mut index = 0;

        for group in grouped(self.nodes) {
            if !lines.is_empty() {
                lines.push(Line::from(""));
            }
            lines.push(Line::from(Span::styled(
                group.category.to_uppercase(),
                self.theme.category_style(),
            )));

            for node in group.nodes {
                let is_selected = self.selected == Some(node.id);
                let at_cursor = self.focused && index == self.cursor;
                let style = if is_selected {
                    self.theme.selected_style(at_cursor)
                } else if at_cursor {
                    self.theme.cursor_style()
                } else {
                    self.theme.agent_style()
                };

                let marker = if is_selected { "▸" } else { " " };
                lines.push(Line::from(Span::styled(
                    format!("{marker}{:>2}. {}", index + 1, node.title),
                    style,
                )));
                if is_selected {
                    lines.push(Line::from(Span::styled(
                        format!("     {:.2}", node.coordinates),
                        self.theme.system_style(),
                    )));
                }
                index += 1;
            }
        }
        lines
    }
}

impl Widget for CatalogWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = if self.focused {
            " Archive [j/k Enter] "
        } else {
            " Archive "
        };

        let block = Block::default()
            .title(Span::styled(title, self.theme.title_style(self.focused)))
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.focused));

        Paragraph::new(self.lines()).block(block).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storymap_core::STORY_NODES;

    fn rendered(widget: CatalogWidget<'_>) -> String {
        let area = Rect::new(0, 0, 34, 20);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_groups_and_selection() {
        let theme = StoryTheme::default();
        let text = rendered(CatalogWidget::new(STORY_NODES, &theme).selected(Some("pegasus")));

        let vedic = text.find("VEDIC").unwrap();
        let classical = text.find("CLASSICAL").unwrap();
        let cosmic = text.find("COSMIC").unwrap();
        assert!(vedic < classical && classical < cosmic);
        assert!(text.contains("▸ 4. Pegasus"));
        assert!(text.contains("[40.01, -14.30]"));
        assert!(!text.contains("[40.22, 43.67]"));
    }
}
