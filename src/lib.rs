#![allow(clippy::collapsible_if)]

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod services;
pub mod tui;

// Re-export commonly used types
pub use core::{ColumnConfig, ColumnDescriptor, ColumnId, Dataset, DownloadOptions, PreviewGrid};
pub use error::{ErrorKind, Operation, PrepError};
pub use services::{ApiClient, ExportController, IntakeController, Session};
pub use tui::{Action, ActionCategory};
