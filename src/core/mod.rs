pub mod columns;
pub mod download;
pub mod preview;
pub mod types;

pub use columns::{ColumnConfig, ColumnField};
pub use download::{ColumnSelection, DownloadOptions, DownloadRequest};
pub use preview::{PREVIEW_ROW_LIMIT, PreviewGrid};
pub use types::*;
