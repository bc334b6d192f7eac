use serde::{Deserialize, Serialize};

use crate::core::columns::ColumnConfig;
use crate::error::Result;

/// User-editable options sent with every download
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadOptions {
    pub tag_name: String,
    pub tag_value: String,
    pub remove_duplicates: bool,
    pub remove_empty: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            tag_name: "Tag".to_string(),
            tag_value: String::new(),
            remove_duplicates: true,
            remove_empty: false,
        }
    }
}

/// One exported column as the backend expects it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSelection {
    pub original_name: String,
    pub display_name: String,
}

/// Everything the backend needs to produce the reshaped file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub columns: Vec<ColumnSelection>,
    pub options: DownloadOptions,
}

impl DownloadRequest {
    /// Snapshot the included columns (in display order) and the options.
    pub fn build(config: &ColumnConfig, options: &DownloadOptions) -> Self {
        let columns = config
            .included()
            .into_iter()
            .map(|c| ColumnSelection {
                original_name: c.original_name().to_string(),
                display_name: c.display_name().to_string(),
            })
            .collect();
        Self {
            columns,
            options: options.clone(),
        }
    }

    /// Multipart text fields in submission order.
    pub fn form_fields(&self) -> Result<Vec<(&'static str, String)>> {
        Ok(vec![
            ("columns", serde_json::to_string(&self.columns)?),
            ("tagName", self.options.tag_name.clone()),
            ("tagValue", self.options.tag_value.clone()),
            ("removeDuplicates", self.options.remove_duplicates.to_string()),
            ("removeEmpty", self.options.remove_empty.to_string()),
        ])
    }
}
