use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// Stable identifier for a column descriptor
///
/// Assigned from the header's position in the uploaded header list, so it
/// never depends on the (editable) display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColumnId(usize);

impl ColumnId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One column of the uploaded file as the user has configured it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    pub(crate) id: ColumnId,
    pub(crate) original_name: String,
    pub(crate) display_name: String,
    pub(crate) included: bool,
    pub(crate) order: usize,
}

impl ColumnDescriptor {
    pub fn id(&self) -> ColumnId {
        self.id
    }

    /// Header text as received from the server
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn included(&self) -> bool {
        self.included
    }

    /// Zero-based rank in the column list
    pub fn order(&self) -> usize {
        self.order
    }
}

/// A data row keyed by original header name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow(HashMap<String, String>);

impl RawRow {
    /// Build a row from a JSON object.
    ///
    /// Strings are kept as-is, numbers and booleans are stringified and
    /// `null` values are dropped so the cell reads as absent.
    pub fn from_json(object: Map<String, Value>) -> Self {
        let cells = object
            .into_iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    Value::Null => return None,
                    Value::String(s) => s,
                    Value::Bool(b) => b.to_string(),
                    Value::Number(n) => n.to_string(),
                    other => other.to_string(),
                };
                Some((key, text))
            })
            .collect();
        Self(cells)
    }

    pub fn get(&self, original_name: &str) -> Option<&str> {
        self.0.get(original_name).map(String::as_str)
    }

    /// Cell text, or an empty string when the row has no value for the column
    pub fn cell(&self, original_name: &str) -> &str {
        self.get(original_name).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Parsed upload result: header list plus every data row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<RawRow>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, rows: Vec<RawRow>) -> Self {
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
