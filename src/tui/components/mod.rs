pub mod column_list;
pub mod message_dialog;
pub mod preview_table;
pub mod text_prompt;

pub use column_list::{ColumnEntry, ColumnList};
pub use message_dialog::MessageDialog;
pub use preview_table::PreviewTable;
pub use text_prompt::{PromptTarget, TextPrompt};
