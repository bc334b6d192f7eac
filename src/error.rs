use strum::Display;
use thiserror::Error;

use crate::core::ColumnId;

/// Message used when the backend fails without a structured `{error}` body.
pub const GENERIC_NETWORK_ERROR: &str = "Network response was not ok";

/// The two calls made against the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    Upload,
    Download,
}

impl Operation {
    /// Text of the blocking alert shown to the user when this operation fails.
    pub fn alert(&self, err: &PrepError) -> String {
        if err.kind() == ErrorKind::Validation {
            return err.to_string();
        }
        match self {
            Operation::Upload => format!("Error processing file: {err}"),
            Operation::Download => format!("Error downloading file: {err}"),
        }
    }
}

/// Coarse classification used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected on the client, never reached the network
    Validation,
    /// Transport failure or non-2xx without a readable error body
    Network,
    /// Backend answered with a structured `{error}` message
    Application,
    /// Column configuration edit rejected
    Configuration,
    Io,
    Internal,
}

#[derive(Error, Debug)]
pub enum PrepError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Network(String),

    #[error("{0}")]
    Application(String),

    #[error("column '{0}' is mandatory and cannot be excluded or renamed")]
    MandatoryColumn(String),

    #[error("unknown column {0}")]
    UnknownColumn(ColumnId),

    #[error("invalid column order: {0}")]
    InvalidReorder(String),

    #[error("{0} already in progress")]
    Busy(Operation),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Encoding(#[from] serde_json::Error),
}

impl PrepError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PrepError::Validation(_) | PrepError::Busy(_) => ErrorKind::Validation,
            PrepError::Network(_) => ErrorKind::Network,
            PrepError::Application(_) => ErrorKind::Application,
            PrepError::MandatoryColumn(_)
            | PrepError::UnknownColumn(_)
            | PrepError::InvalidReorder(_) => ErrorKind::Configuration,
            PrepError::Io(_) => ErrorKind::Io,
            PrepError::Encoding(_) => ErrorKind::Internal,
        }
    }
}

impl From<reqwest::Error> for PrepError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PrepError::Network("request timed out".to_string())
        } else if err.is_connect() {
            PrepError::Network(format!("could not reach server: {err}"))
        } else {
            PrepError::Network(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, PrepError>;
