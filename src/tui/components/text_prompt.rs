use crate::core::ColumnId;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

/// What the entered text will be applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTarget {
    RenameColumn(ColumnId),
    TagName,
    TagValue,
    OpenFile,
}

impl PromptTarget {
    pub fn title(&self) -> &'static str {
        match self {
            PromptTarget::RenameColumn(_) => "Rename column",
            PromptTarget::TagName => "Tag column name",
            PromptTarget::TagValue => "Tag value",
            PromptTarget::OpenFile => "Open CSV file",
        }
    }
}

/// Single-line text input shown as a modal
#[derive(Debug, Clone)]
pub struct TextPrompt {
    target: PromptTarget,
    value: String,
    /// Cursor position in chars
    cursor: usize,
}

impl TextPrompt {
    pub fn new(target: PromptTarget, initial: impl Into<String>) -> Self {
        let value = initial.into();
        let cursor = value.chars().count();
        Self {
            target,
            value,
            cursor,
        }
    }

    pub fn target(&self) -> PromptTarget {
        self.target
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map_or(self.value.len(), |(i, _)| i)
    }

    pub fn insert_str(&mut self, text: &str) {
        let text: String = text.chars().filter(|c| !c.is_control()).collect();
        let at = self.byte_index(self.cursor);
        self.value.insert_str(at, &text);
        self.cursor += text.chars().count();
    }

    /// Apply an editing key. Returns false for keys the prompt ignores.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(c)
                if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                let at = self.byte_index(self.cursor);
                self.value.insert(at, c);
                self.cursor += 1;
            }
            KeyCode::Backspace if self.cursor > 0 => {
                self.cursor -= 1;
                let at = self.byte_index(self.cursor);
                self.value.remove(at);
            }
            KeyCode::Delete if self.cursor < self.value.chars().count() => {
                let at = self.byte_index(self.cursor);
                self.value.remove(at);
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.value.chars().count()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.value.chars().count(),
            KeyCode::Backspace | KeyCode::Delete => {}
            _ => return false,
        }
        true
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let width = area.width.clamp(20, 60).min(area.width);
        let height = 5.min(area.height);
        let modal = Rect {
            x: area.x + area.width.saturating_sub(width) / 2,
            y: area.y + area.height.saturating_sub(height) / 2,
            width,
            height,
        };

        let (before, after) = self.value.split_at(self.byte_index(self.cursor));
        let mut after_chars = after.chars();
        let under_cursor = after_chars.next().map_or(" ".to_string(), |c| c.to_string());
        let cursor_style = Style::default().fg(Color::Black).bg(Color::White);
        let input = Line::from(vec![
            Span::raw(before.to_string()),
            Span::styled(under_cursor, cursor_style),
            Span::raw(after_chars.as_str().to_string()),
        ]);
        let hint = Line::from(Span::styled(
            "Enter to apply, Esc to cancel",
            Style::default().fg(Color::Gray),
        ));

        let block = Block::default()
            .title(self.target.title())
            .borders(Borders::ALL)
            .border_type(BorderType::Double);
        frame.render_widget(Clear, modal);
        frame.render_widget(Paragraph::new(vec![input, Line::default(), hint]).block(block), modal);
    }
}
