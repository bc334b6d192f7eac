use crate::core::columns::is_mandatory;
use crate::core::{ColumnConfig, ColumnId};
use crate::tui::{Action, Component, Theme};
use color_eyre::Result;
use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
};

/// One row of the column list as drawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnEntry {
    pub id: ColumnId,
    pub original_name: String,
    pub display_name: String,
    pub included: bool,
    pub locked: bool,
}

/// Sidebar listing every column in display order with its include flag
pub struct ColumnList {
    entries: Vec<ColumnEntry>,
    cursor: usize,
    theme: Theme,
    supported_actions: Vec<Action>,
}

impl ColumnList {
    pub fn new(theme: Theme) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            theme,
            supported_actions: vec![
                Action::MoveUp,
                Action::MoveDown,
                Action::ToggleColumn,
                Action::RenameColumn,
                Action::MoveColumnUp,
                Action::MoveColumnDown,
            ],
        }
    }

    /// Refresh from the configuration, keeping the cursor on the same column
    pub fn set_columns(&mut self, config: &ColumnConfig) {
        let selected = self.selected().map(|e| e.id);
        self.entries = config
            .descriptors()
            .into_iter()
            .map(|c| ColumnEntry {
                id: c.id(),
                original_name: c.original_name().to_string(),
                display_name: c.display_name().to_string(),
                included: c.included(),
                locked: is_mandatory(c.original_name()),
            })
            .collect();
        match selected {
            Some(id) => self.select(id),
            None => self.cursor = 0,
        }
        self.cursor = self.cursor.min(self.entries.len().saturating_sub(1));
    }

    /// Start over at the top, used when a new dataset is loaded
    pub fn reset(&mut self, config: &ColumnConfig) {
        self.entries.clear();
        self.cursor = 0;
        self.set_columns(config);
    }

    pub fn select(&mut self, id: ColumnId) {
        if let Some(pos) = self.entries.iter().position(|e| e.id == id) {
            self.cursor = pos;
        }
    }

    pub fn selected(&self) -> Option<&ColumnEntry> {
        self.entries.get(self.cursor)
    }

    pub fn entries(&self) -> &[ColumnEntry] {
        &self.entries
    }
}

impl Component for ColumnList {
    fn handle_action(&mut self, action: Action) -> Result<bool> {
        match action {
            Action::MoveUp => {
                self.cursor = self.cursor.saturating_sub(1);
                Ok(true)
            }
            Action::MoveDown => {
                if self.cursor + 1 < self.entries.len() {
                    self.cursor += 1;
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .entries
            .iter()
            .map(|entry| {
                let marker = match (entry.included, entry.locked) {
                    (_, true) => "[*]",
                    (true, false) => "[x]",
                    (false, false) => "[ ]",
                };
                let name_style = if entry.locked {
                    self.theme.locked_style()
                } else if entry.included {
                    self.theme.normal_style()
                } else {
                    self.theme.excluded_style()
                };
                let mut spans = vec![
                    Span::raw(format!("{marker} ")),
                    Span::styled(entry.display_name.clone(), name_style),
                ];
                if entry.display_name != entry.original_name {
                    spans.push(Span::styled(
                        format!(" ({})", entry.original_name),
                        Style::default().fg(self.theme.excluded),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let included = self.entries.iter().filter(|e| e.included).count();
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Columns [{}/{}]", included, self.entries.len()))
                    .border_style(self.theme.border_style(true)),
            )
            .highlight_style(self.theme.selected_style());

        let mut state = ListState::default();
        if !self.entries.is_empty() {
            state.select(Some(self.cursor));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn supported_actions(&self) -> &[Action] {
        &self.supported_actions
    }

    fn name(&self) -> &str {
        "ColumnList"
    }
}
