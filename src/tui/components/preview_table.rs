use crate::core::PreviewGrid;
use crate::tui::{Action, Component, Theme};
use color_eyre::Result;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Rect},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
};

/// Widest a preview column is drawn, in characters
const MAX_COLUMN_WIDTH: usize = 30;

/// Text shown before any file is loaded
pub const DROP_HINT: &str =
    "Drag and drop a CSV file here (or paste its path), or press 'o' to choose one.";

/// Read-only table of the first rows as they will be exported
pub struct PreviewTable {
    grid: Option<PreviewGrid>,
    /// First visible column
    left: usize,
    theme: Theme,
    supported_actions: Vec<Action>,
}

impl PreviewTable {
    pub fn new(theme: Theme) -> Self {
        Self {
            grid: None,
            left: 0,
            theme,
            supported_actions: vec![Action::ScrollLeft, Action::ScrollRight],
        }
    }

    pub fn set_grid(&mut self, grid: Option<PreviewGrid>) {
        let columns = grid.as_ref().map_or(0, |g| g.column_count());
        self.left = self.left.min(columns.saturating_sub(1));
        self.grid = grid;
    }

    pub fn grid(&self) -> Option<&PreviewGrid> {
        self.grid.as_ref()
    }

    pub fn left(&self) -> usize {
        self.left
    }

    fn column_width(grid: &PreviewGrid, index: usize) -> u16 {
        let widest = grid
            .rows
            .iter()
            .map(|r| r[index].chars().count())
            .chain(std::iter::once(grid.headers[index].chars().count()))
            .max()
            .unwrap_or(0);
        widest.clamp(3, MAX_COLUMN_WIDTH) as u16
    }
}

impl Component for PreviewTable {
    fn handle_action(&mut self, action: Action) -> Result<bool> {
        let columns = self.grid.as_ref().map_or(0, |g| g.column_count());
        match action {
            Action::ScrollLeft => {
                self.left = self.left.saturating_sub(1);
                Ok(true)
            }
            Action::ScrollRight => {
                if self.left + 1 < columns {
                    self.left += 1;
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(false));

        let Some(grid) = &self.grid else {
            let hint = Paragraph::new(DROP_HINT)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(block.title("Preview"));
            frame.render_widget(hint, area);
            return;
        };

        let title = if grid.truncated() {
            format!("Preview ({} of {} rows)", grid.rows.len(), grid.total_rows)
        } else {
            format!("Preview ({} rows)", grid.total_rows)
        };

        if grid.column_count() == 0 {
            let empty = Paragraph::new("No columns selected.")
                .alignment(Alignment::Center)
                .block(block.title(title));
            frame.render_widget(empty, area);
            return;
        }

        let visible = self.left..grid.column_count();
        let header = Row::new(
            grid.headers[visible.clone()]
                .iter()
                .map(|h| Cell::from(h.as_str())),
        )
        .style(self.theme.header_style());

        let rows: Vec<Row> = grid
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let style = if i % 2 == 1 {
                    self.theme.alt_row_style()
                } else {
                    self.theme.normal_style()
                };
                Row::new(row[visible.clone()].iter().map(|c| Cell::from(c.as_str()))).style(style)
            })
            .collect();

        let widths: Vec<Constraint> = visible
            .map(|i| Constraint::Length(Self::column_width(grid, i)))
            .collect();

        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(2)
            .block(block.title(title));
        frame.render_widget(table, area);
    }

    fn supported_actions(&self) -> &[Action] {
        &self.supported_actions
    }

    fn name(&self) -> &str {
        "PreviewTable"
    }
}
