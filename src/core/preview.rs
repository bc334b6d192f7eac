use std::fmt;

use crate::core::columns::ColumnConfig;
use crate::core::types::{ColumnId, Dataset};

/// Maximum number of data rows shown in a preview.
pub const PREVIEW_ROW_LIMIT: usize = 10;

/// Projection of the dataset through the current column configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewGrid {
    pub column_ids: Vec<ColumnId>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Row count of the whole dataset, not just the preview
    pub total_rows: usize,
}

impl PreviewGrid {
    /// Rebuild the grid from scratch.
    pub fn render(config: &ColumnConfig, dataset: &Dataset) -> Self {
        let columns = config.included();
        let column_ids = columns.iter().map(|c| c.id()).collect();
        let headers = columns.iter().map(|c| c.display_name().to_string()).collect();
        let rows = dataset
            .rows()
            .iter()
            .take(PREVIEW_ROW_LIMIT)
            .map(|row| {
                columns
                    .iter()
                    .map(|c| row.cell(c.original_name()).to_string())
                    .collect()
            })
            .collect();

        Self {
            column_ids,
            headers,
            rows,
            total_rows: dataset.row_count(),
        }
    }

    /// Whether rows were cut off by the preview limit
    pub fn truncated(&self) -> bool {
        self.total_rows > self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }
}

impl fmt::Display for PreviewGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.headers.is_empty() {
            return writeln!(f, "(no columns selected)");
        }

        let widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                self.rows
                    .iter()
                    .map(|r| r[i].chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let write_line = |f: &mut fmt::Formatter<'_>, cells: &[String]| -> fmt::Result {
            let line = cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| {
                    let pad = width - cell.chars().count();
                    format!("{cell}{}", " ".repeat(pad))
                })
                .collect::<Vec<_>>()
                .join(" | ");
            writeln!(f, "{}", line.trim_end())
        };

        write_line(f, &self.headers)?;
        let rule = widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-");
        writeln!(f, "{rule}")?;
        for row in &self.rows {
            write_line(f, row)?;
        }
        if self.truncated() {
            writeln!(f, "(showing {} of {} rows)", self.rows.len(), self.total_rows)?;
        }
        Ok(())
    }
}
