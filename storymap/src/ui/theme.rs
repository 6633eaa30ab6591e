//! Color theme and styling for the story map TUI

use ratatui::style::{Color, Modifier, Style};

/// Archive UI color theme
#[derive(Debug, Clone)]
pub struct StoryTheme {
    // Base colors
    pub foreground: Color,
    pub border: Color,
    pub border_focused: Color,
    pub accent: Color,

    // Transcript colors
    pub user_text: Color,
    pub agent_text: Color,
    pub system_text: Color,

    // Viewport layers
    pub satellite: Color,
    pub illustrated: Color,
    pub live: Color,
}

impl Default for StoryTheme {
    fn default() -> Self {
        Self {
            foreground: Color::White,
            border: Color::DarkGray,
            border_focused: Color::Yellow,
            accent: Color::LightYellow,

            user_text: Color::Cyan,
            agent_text: Color::White,
            system_text: Color::DarkGray,

            satellite: Color::Green,
            illustrated: Color::Magenta,
            live: Color::LightRed,
        }
    }
}

impl StoryTheme {
    /// Explorer entries in the transcript
    pub fn user_style(&self) -> Style {
        Style::default()
            .fg(self.user_text)
            .add_modifier(Modifier::ITALIC)
    }

    /// Archive (agent) entries
    pub fn agent_style(&self) -> Style {
        Style::default().fg(self.agent_text)
    }

    pub fn system_style(&self) -> Style {
        Style::default()
            .fg(self.system_text)
            .add_modifier(Modifier::DIM)
    }

    /// Category headers in the archive list
    pub fn category_style(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    /// The selected story node, and the cursor when focused
    pub fn selected_style(&self, cursor: bool) -> Style {
        let style = Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD);
        if cursor {
            style.add_modifier(Modifier::REVERSED)
        } else {
            style
        }
    }

    pub fn cursor_style(&self) -> Style {
        Style::default().add_modifier(Modifier::REVERSED)
    }

    pub fn border_style(&self, focused: bool) -> Style {
        Style::default().fg(if focused {
            self.border_focused
        } else {
            self.border
        })
    }

    pub fn title_style(&self, focused: bool) -> Style {
        let style = Style::default().fg(if focused {
            self.border_focused
        } else {
            self.foreground
        });

        if focused {
            style.add_modifier(Modifier::BOLD)
        } else {
            style
        }
    }

    pub fn live_style(&self) -> Style {
        Style::default().fg(self.live).add_modifier(Modifier::BOLD)
    }
}
