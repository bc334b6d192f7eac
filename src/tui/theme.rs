use ratatui::style::{Color, Modifier, Style};

/// Color scheme for the TUI
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,

    // General UI colors
    pub foreground: Color,
    pub border: Color,
    pub border_focused: Color,

    // Table colors
    pub header_fg: Color,
    pub selected_fg: Color,
    pub selected_bg: Color,
    pub row_alt_bg: Color,

    // Column list markers
    pub excluded: Color,
    pub locked: Color,

    // Status/feedback colors
    pub success: Color,
    pub error: Color,
    pub busy: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            name: "Default Dark".to_string(),
            foreground: Color::Gray,
            border: Color::DarkGray,
            border_focused: Color::Cyan,
            header_fg: Color::Cyan,
            selected_fg: Color::Black,
            selected_bg: Color::Cyan,
            row_alt_bg: Color::Rgb(25, 25, 35),
            excluded: Color::DarkGray,
            locked: Color::Yellow,
            success: Color::Green,
            error: Color::Red,
            busy: Color::Yellow,
        }
    }
}

impl Theme {
    pub fn header_style(&self) -> Style {
        Style::default()
            .fg(self.header_fg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn selected_style(&self) -> Style {
        Style::default()
            .fg(self.selected_fg)
            .bg(self.selected_bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn normal_style(&self) -> Style {
        Style::default().fg(self.foreground)
    }

    pub fn alt_row_style(&self) -> Style {
        Style::default().fg(self.foreground).bg(self.row_alt_bg)
    }

    pub fn excluded_style(&self) -> Style {
        Style::default()
            .fg(self.excluded)
            .add_modifier(Modifier::CROSSED_OUT)
    }

    pub fn locked_style(&self) -> Style {
        Style::default().fg(self.locked)
    }

    pub fn border_style(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.border_focused)
        } else {
            Style::default().fg(self.border)
        }
    }

    pub fn success_style(&self) -> Style {
        Style::default().fg(self.success)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn busy_style(&self) -> Style {
        Style::default()
            .fg(self.busy)
            .add_modifier(Modifier::BOLD)
    }
}
