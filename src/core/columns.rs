use std::collections::HashSet;

use tracing::{debug, warn};

use crate::core::types::{ColumnDescriptor, ColumnId};
use crate::error::{PrepError, Result};

/// Well-known headers in the order they should appear.
pub const PREFERRED_ORDER: [&str; 4] = ["first_name", "email", "phone_number", "last_name"];

/// Headers included by default; everything else starts excluded.
pub const DEFAULT_INCLUDED: [&str; 4] = ["first_name", "email", "phone_number", "last_name"];

/// Default display names for well-known headers.
pub const DISPLAY_NAMES: [(&str, &str); 4] = [
    ("first_name", "Name"),
    ("email", "Email"),
    ("phone_number", "Phone"),
    ("last_name", "Last_name"),
];

/// Columns that are always exported under their default name.
pub const MANDATORY_COLUMNS: [&str; 1] = ["email"];

pub fn is_mandatory(original_name: &str) -> bool {
    MANDATORY_COLUMNS.contains(&original_name)
}

pub fn default_display_name(original_name: &str) -> String {
    DISPLAY_NAMES
        .iter()
        .find(|(header, _)| *header == original_name)
        .map(|(_, display)| display.to_string())
        .unwrap_or_else(|| original_name.to_string())
}

fn preferred_rank(original_name: &str) -> usize {
    PREFERRED_ORDER
        .iter()
        .position(|h| *h == original_name)
        .unwrap_or(usize::MAX)
}

/// Editable field of a column descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnField {
    DisplayName(String),
    Included(bool),
}

/// The column configuration for the currently loaded dataset
///
/// Descriptors are stored by id (`columns[id]`); `order` carries the
/// visual position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnConfig {
    columns: Vec<ColumnDescriptor>,
}

impl ColumnConfig {
    /// Build one descriptor per header with default names, inclusion and order.
    pub fn initialize(headers: &[String]) -> Self {
        let mut columns: Vec<ColumnDescriptor> = headers
            .iter()
            .enumerate()
            .map(|(index, header)| ColumnDescriptor {
                id: ColumnId::new(index),
                original_name: header.clone(),
                display_name: default_display_name(header),
                included: DEFAULT_INCLUDED.contains(&header.as_str()) || is_mandatory(header),
                order: 0,
            })
            .collect();

        let mut ranked: Vec<usize> = (0..columns.len()).collect();
        ranked.sort_by_key(|&i| preferred_rank(&columns[i].original_name));
        for (order, index) in ranked.into_iter().enumerate() {
            columns[index].order = order;
        }

        debug!("Initialized column configuration with {} columns", columns.len());
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, id: ColumnId) -> Option<&ColumnDescriptor> {
        self.columns.get(id.index())
    }

    pub fn find_by_original_name(&self, original_name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.original_name == original_name)
    }

    /// All descriptors in display order
    pub fn descriptors(&self) -> Vec<&ColumnDescriptor> {
        let mut sorted: Vec<&ColumnDescriptor> = self.columns.iter().collect();
        sorted.sort_by_key(|c| c.order);
        sorted
    }

    /// Included descriptors in display order
    pub fn included(&self) -> Vec<&ColumnDescriptor> {
        self.descriptors().into_iter().filter(|c| c.included).collect()
    }

    /// Ids in display order
    pub fn ordered_ids(&self) -> Vec<ColumnId> {
        self.descriptors().iter().map(|c| c.id).collect()
    }

    pub fn set_field(&mut self, id: ColumnId, field: ColumnField) -> Result<()> {
        let column = self
            .columns
            .get(id.index())
            .ok_or(PrepError::UnknownColumn(id))?;

        if is_mandatory(&column.original_name) {
            let locked = match &field {
                ColumnField::Included(included) => !included,
                ColumnField::DisplayName(name) => *name != column.display_name,
            };
            if locked {
                warn!("Rejected edit of mandatory column '{}'", column.original_name);
                return Err(PrepError::MandatoryColumn(column.original_name.clone()));
            }
        }

        match field {
            ColumnField::DisplayName(name) => {
                if self
                    .columns
                    .iter()
                    .any(|c| c.id != id && c.display_name == name)
                {
                    warn!("Display name '{}' is used by more than one column", name);
                }
                debug!("Column {} display name -> '{}'", id, name);
                self.columns[id.index()].display_name = name;
            }
            ColumnField::Included(included) => {
                debug!("Column {} included -> {}", id, included);
                self.columns[id.index()].included = included;
            }
        }
        Ok(())
    }

    pub fn set_display_name(&mut self, id: ColumnId, name: impl Into<String>) -> Result<()> {
        self.set_field(id, ColumnField::DisplayName(name.into()))
    }

    pub fn set_included(&mut self, id: ColumnId, included: bool) -> Result<()> {
        self.set_field(id, ColumnField::Included(included))
    }

    /// Flip the include flag and return the new value.
    pub fn toggle_included(&mut self, id: ColumnId) -> Result<bool> {
        let current = self
            .get(id)
            .map(|c| c.included)
            .ok_or(PrepError::UnknownColumn(id))?;
        self.set_included(id, !current)?;
        Ok(!current)
    }

    /// Apply a complete visual order.
    ///
    /// `new_order` must name every column exactly once.
    pub fn reorder(&mut self, new_order: &[ColumnId]) -> Result<()> {
        if new_order.len() != self.columns.len() {
            return Err(PrepError::InvalidReorder(format!(
                "expected {} columns, got {}",
                self.columns.len(),
                new_order.len()
            )));
        }
        let mut seen = HashSet::with_capacity(new_order.len());
        for id in new_order {
            if id.index() >= self.columns.len() {
                return Err(PrepError::InvalidReorder(format!("unknown column {id}")));
            }
            if !seen.insert(*id) {
                return Err(PrepError::InvalidReorder(format!("column {id} listed twice")));
            }
        }

        for (order, id) in new_order.iter().enumerate() {
            self.columns[id.index()].order = order;
        }
        debug!("Columns reordered");
        Ok(())
    }

    /// Move one column `delta` steps in the visual order.
    ///
    /// Returns `Ok(false)` when the move would go past either end.
    pub fn move_column(&mut self, id: ColumnId, delta: isize) -> Result<bool> {
        let mut ids = self.ordered_ids();
        let from = ids
            .iter()
            .position(|c| *c == id)
            .ok_or(PrepError::UnknownColumn(id))?;
        let to = from as isize + delta;
        if delta == 0 || to < 0 || to >= ids.len() as isize {
            return Ok(false);
        }
        let moved = ids.remove(from);
        ids.insert(to as usize, moved);
        self.reorder(&ids)?;
        Ok(true)
    }
}
