use std::path::{Path, PathBuf};

use tracing::{info, warn};
use url::Url;

use crate::error::{PrepError, Result};
use crate::services::api_client::ApiClient;
use crate::services::session::Session;

/// Message shown when a non-CSV file is picked or dropped.
pub const WRONG_FILE_TYPE: &str = "Please upload a CSV file";

const CSV_SUFFIX: &str = ".csv";

/// A local CSV file accepted for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvFile {
    pub path: PathBuf,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl CsvFile {
    /// File name without the `.csv` suffix, used as the default tag value
    pub fn default_tag_value(&self) -> String {
        self.file_name
            .strip_suffix(CSV_SUFFIX)
            .unwrap_or(&self.file_name)
            .to_string()
    }
}

/// Check the picked file name. The suffix test is case-sensitive.
pub fn validate_file_name(file_name: &str) -> Result<()> {
    if file_name.ends_with(CSV_SUFFIX) {
        Ok(())
    } else {
        Err(PrepError::Validation(WRONG_FILE_TYPE.to_string()))
    }
}

/// Validate the name and read the file.
///
/// Nothing is read from disk when the name is rejected.
pub fn accept(path: &Path) -> Result<CsvFile> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    if let Err(e) = validate_file_name(&file_name) {
        warn!("Rejected file {}", path.display());
        return Err(e);
    }
    let bytes = std::fs::read(path)?;
    Ok(CsvFile {
        path: path.to_path_buf(),
        file_name,
        bytes,
    })
}

/// Turn a terminal drop/paste payload into a path.
///
/// Terminals paste dropped files as plain text, sometimes quoted or as a
/// `file://` URL. Only the first non-empty line is used.
pub fn parse_dropped_path(text: &str) -> Option<PathBuf> {
    let line = text.lines().map(str::trim).find(|l| !l.is_empty())?;
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|q| {
            line.strip_prefix(*q)
                .and_then(|rest| rest.strip_suffix(*q))
        })
        .unwrap_or(line);
    if unquoted.starts_with("file://") {
        if let Some(path) = Url::parse(unquoted)
            .ok()
            .and_then(|url| url.to_file_path().ok())
        {
            return Some(path);
        }
    }
    let path = unquoted.strip_prefix("file://").unwrap_or(unquoted);
    let path = path.replace("\\ ", " ");
    if path.is_empty() {
        None
    } else {
        Some(PathBuf::from(path))
    }
}

/// Drives a picked or dropped file through upload into the session
#[derive(Debug, Clone)]
pub struct IntakeController {
    client: ApiClient,
}

impl IntakeController {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Validate, upload and apply the result to the session.
    ///
    /// The busy flag is cleared whatever the outcome.
    pub async fn process_file(&self, session: &mut Session, path: &Path) -> Result<()> {
        let file = accept(path)?;
        let ticket = session.begin_upload(&file)?;
        let result = self.client.upload(&file).await;
        session.complete_upload(ticket, result)?;
        info!("Loaded {}", file.file_name);
        Ok(())
    }
}
