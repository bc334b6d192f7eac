use serde::{Deserialize, Serialize};
use std::fmt;

/// All possible actions in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Action {
    // Navigation
    MoveUp,
    MoveDown,
    ScrollLeft,
    ScrollRight,

    // Column configuration
    ToggleColumn,
    RenameColumn,
    MoveColumnUp,
    MoveColumnDown,

    // Download options
    EditTagName,
    EditTagValue,
    ToggleRemoveDuplicates,
    ToggleRemoveEmpty,

    // File Operations
    OpenFile,
    Download,

    // Application
    Quit,
    Confirm,
    Cancel,
}

impl Action {
    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Action::MoveUp => "Select previous column",
            Action::MoveDown => "Select next column",
            Action::ScrollLeft => "Scroll preview left",
            Action::ScrollRight => "Scroll preview right",
            Action::ToggleColumn => "Include or exclude the selected column",
            Action::RenameColumn => "Rename the selected column",
            Action::MoveColumnUp => "Move the selected column up",
            Action::MoveColumnDown => "Move the selected column down",
            Action::EditTagName => "Edit the tag column name",
            Action::EditTagValue => "Edit the tag value",
            Action::ToggleRemoveDuplicates => "Toggle duplicate removal",
            Action::ToggleRemoveEmpty => "Toggle empty row removal",
            Action::OpenFile => "Open a CSV file",
            Action::Download => "Download the processed file",
            Action::Quit => "Quit application",
            Action::Confirm => "Confirm action",
            Action::Cancel => "Cancel action",
        }
    }

    /// Short name for the key hint line
    pub fn label(&self) -> &'static str {
        match self {
            Action::MoveUp => "Up",
            Action::MoveDown => "Down",
            Action::ScrollLeft => "Left",
            Action::ScrollRight => "Right",
            Action::ToggleColumn => "Include",
            Action::RenameColumn => "Rename",
            Action::MoveColumnUp => "Move Up",
            Action::MoveColumnDown => "Move Down",
            Action::EditTagName => "Tag Name",
            Action::EditTagValue => "Tag Value",
            Action::ToggleRemoveDuplicates => "Dedupe",
            Action::ToggleRemoveEmpty => "Drop Empty",
            Action::OpenFile => "Open",
            Action::Download => "Download",
            Action::Quit => "Quit",
            Action::Confirm => "Enter",
            Action::Cancel => "Esc",
        }
    }

    /// Get category for grouping in help screen
    pub fn category(&self) -> ActionCategory {
        match self {
            Action::MoveUp | Action::MoveDown | Action::ScrollLeft | Action::ScrollRight => {
                ActionCategory::Navigation
            }

            Action::ToggleColumn
            | Action::RenameColumn
            | Action::MoveColumnUp
            | Action::MoveColumnDown => ActionCategory::Columns,

            Action::EditTagName
            | Action::EditTagValue
            | Action::ToggleRemoveDuplicates
            | Action::ToggleRemoveEmpty => ActionCategory::Options,

            Action::OpenFile | Action::Download => ActionCategory::FileOps,

            Action::Quit | Action::Confirm | Action::Cancel => ActionCategory::Application,
        }
    }

    /// Get all possible actions (for validation)
    pub fn all() -> Vec<Action> {
        vec![
            Action::MoveUp,
            Action::MoveDown,
            Action::ScrollLeft,
            Action::ScrollRight,
            Action::ToggleColumn,
            Action::RenameColumn,
            Action::MoveColumnUp,
            Action::MoveColumnDown,
            Action::EditTagName,
            Action::EditTagValue,
            Action::ToggleRemoveDuplicates,
            Action::ToggleRemoveEmpty,
            Action::OpenFile,
            Action::Download,
            Action::Quit,
            Action::Confirm,
            Action::Cancel,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionCategory {
    Navigation,
    Columns,
    Options,
    FileOps,
    Application,
}

impl fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionCategory::Navigation => write!(f, "Navigation"),
            ActionCategory::Columns => write!(f, "Columns"),
            ActionCategory::Options => write!(f, "Download Options"),
            ActionCategory::FileOps => write!(f, "File Operations"),
            ActionCategory::Application => write!(f, "Application"),
        }
    }
}
