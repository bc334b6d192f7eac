use crate::tui::{Action, Component};
use color_eyre::Result;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, BorderType, Borders, Clear},
};

/// Blocking alert for failures and notices; closed with Enter or Esc
#[derive(Debug, Clone)]
pub struct MessageDialog {
    title: String,
    message: String,
    border_style: Style,
    supported_actions: Vec<Action>,
}

impl MessageDialog {
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_title(message, "Message")
    }

    pub fn with_title(message: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            border_style: Style::default(),
            supported_actions: vec![Action::Confirm, Action::Cancel],
        }
    }

    pub fn with_border_style(mut self, style: Style) -> Self {
        self.border_style = style;
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    fn modal_area(&self, area: Rect) -> Rect {
        let max_width = area.width.clamp(20, 60);
        let wrap_width = max_width.saturating_sub(4) as usize;
        let wrapped = textwrap::wrap(&self.message, wrap_width);
        let content_lines = wrapped.len() as u16;
        let height = content_lines
            .saturating_add(4) // borders + padding
            .clamp(5, area.height.saturating_sub(2).max(5))
            .min(area.height);
        let width = max_width.min(area.width);
        let x = area.x + (area.width.saturating_sub(width)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;
        Rect { x, y, width, height }
    }
}

impl Component for MessageDialog {
    /// Enter and Esc are consumed; the app closes the dialog on either.
    fn handle_action(&mut self, action: Action) -> Result<bool> {
        Ok(self.supported_actions.contains(&action))
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let modal = self.modal_area(area);
        frame.render_widget(Clear, modal);

        let block = Block::default()
            .title(self.title.as_str())
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(self.border_style);
        let inner = block.inner(modal);
        frame.render_widget(block, modal);

        let buf = frame.buffer_mut();
        let wrap_width = inner.width.saturating_sub(2) as usize;
        let wrapped = textwrap::wrap(&self.message, wrap_width.max(1));
        for (i, line) in wrapped.iter().enumerate() {
            if i as u16 >= inner.height.saturating_sub(1) {
                break;
            }
            buf.set_string(
                inner.x + 1,
                inner.y + i as u16,
                line,
                Style::default().fg(Color::White),
            );
        }

        let hint = "Enter/Esc to close";
        let hint_x = inner.x + inner.width.saturating_sub(hint.len() as u16 + 1);
        let hint_y = inner.y + inner.height.saturating_sub(1);
        buf.set_string(hint_x, hint_y, hint, Style::default().fg(Color::Gray));
    }

    fn supported_actions(&self) -> &[Action] {
        &self.supported_actions
    }

    fn name(&self) -> &str {
        "MessageDialog"
    }
}
