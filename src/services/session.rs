use tracing::{debug, info, warn};

use crate::core::{
    ColumnConfig, ColumnField, ColumnId, Dataset, DownloadOptions, DownloadRequest, PreviewGrid,
};
use crate::error::{Operation, PrepError, Result};
use crate::services::api_client::DownloadedFile;
use crate::services::intake::CsvFile;

/// Proof that an operation was started; handed back on completion
#[derive(Debug, PartialEq, Eq)]
pub struct Ticket {
    operation: Operation,
    file_name: Option<String>,
}

/// State of one preparation session
///
/// Owns the loaded dataset, its column configuration and the download
/// options. At most one network operation is outstanding at a time.
#[derive(Debug, Clone, Default)]
pub struct Session {
    dataset: Option<Dataset>,
    columns: ColumnConfig,
    options: DownloadOptions,
    source_name: Option<String>,
    busy: Option<Operation>,
}

impl Session {
    pub fn new(options: DownloadOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn columns(&self) -> &ColumnConfig {
        &self.columns
    }

    pub fn options(&self) -> &DownloadOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut DownloadOptions {
        &mut self.options
    }

    /// Name of the file behind the current dataset
    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    /// The outstanding operation, if any
    pub fn busy(&self) -> Option<Operation> {
        self.busy
    }

    /// Preview of the loaded dataset, `None` before the first upload
    pub fn preview(&self) -> Option<PreviewGrid> {
        self.dataset
            .as_ref()
            .map(|dataset| PreviewGrid::render(&self.columns, dataset))
    }

    fn claim(&mut self, operation: Operation) -> Result<()> {
        if let Some(current) = self.busy {
            warn!("Rejected {} while {} is in progress", operation, current);
            return Err(PrepError::Busy(current));
        }
        self.busy = Some(operation);
        Ok(())
    }

    /// Mark an upload as started and reset the tag value to the file stem.
    pub fn begin_upload(&mut self, file: &CsvFile) -> Result<Ticket> {
        self.claim(Operation::Upload)?;
        self.options.tag_value = file.default_tag_value();
        debug!("Upload of {} started", file.file_name);
        Ok(Ticket {
            operation: Operation::Upload,
            file_name: Some(file.file_name.clone()),
        })
    }

    /// Apply an upload result. Dataset and configuration are replaced together.
    pub fn complete_upload(&mut self, ticket: Ticket, result: Result<Dataset>) -> Result<()> {
        debug_assert_eq!(ticket.operation, Operation::Upload);
        self.busy = None;
        let dataset = result?;
        self.columns = ColumnConfig::initialize(dataset.headers());
        info!(
            "Dataset replaced: {} columns, {} rows",
            self.columns.len(),
            dataset.row_count()
        );
        self.dataset = Some(dataset);
        self.source_name = ticket.file_name;
        Ok(())
    }

    /// Mark a download as started and snapshot the request.
    pub fn begin_download(&mut self) -> Result<(Ticket, DownloadRequest)> {
        if self.dataset.is_none() {
            return Err(PrepError::Validation("Upload a CSV file first".to_string()));
        }
        self.claim(Operation::Download)?;
        let request = DownloadRequest::build(&self.columns, &self.options);
        Ok((
            Ticket {
                operation: Operation::Download,
                file_name: self.source_name.clone(),
            },
            request,
        ))
    }

    /// Finish a download. Dataset and configuration are left untouched.
    pub fn complete_download(
        &mut self,
        ticket: Ticket,
        result: Result<DownloadedFile>,
    ) -> Result<DownloadedFile> {
        debug_assert_eq!(ticket.operation, Operation::Download);
        self.busy = None;
        result
    }

    fn edit_columns<T>(
        &mut self,
        edit: impl FnOnce(&mut ColumnConfig) -> Result<T>,
    ) -> Result<T> {
        if self.busy == Some(Operation::Upload) {
            return Err(PrepError::Busy(Operation::Upload));
        }
        edit(&mut self.columns)
    }

    pub fn set_column_field(&mut self, id: ColumnId, field: ColumnField) -> Result<()> {
        self.edit_columns(|c| c.set_field(id, field))
    }

    pub fn set_display_name(&mut self, id: ColumnId, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.edit_columns(|c| c.set_display_name(id, name))
    }

    pub fn set_included(&mut self, id: ColumnId, included: bool) -> Result<()> {
        self.edit_columns(|c| c.set_included(id, included))
    }

    pub fn toggle_included(&mut self, id: ColumnId) -> Result<bool> {
        self.edit_columns(|c| c.toggle_included(id))
    }

    pub fn reorder(&mut self, new_order: &[ColumnId]) -> Result<()> {
        self.edit_columns(|c| c.reorder(new_order))
    }

    pub fn move_column(&mut self, id: ColumnId, delta: isize) -> Result<bool> {
        self.edit_columns(|c| c.move_column(id, delta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RawRow;
    use std::path::PathBuf;

    fn csv_file(name: &str) -> CsvFile {
        CsvFile {
            path: PathBuf::from(name),
            file_name: name.to_string(),
            bytes: Vec::new(),
        }
    }

    fn dataset(headers: &[&str]) -> Dataset {
        let headers: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
        let row = RawRow::from_iter(headers.iter().map(|h| (h.clone(), "x".to_string())));
        Dataset::new(headers, vec![row])
    }

    fn loaded_session() -> Session {
        let mut session = Session::default();
        let ticket = session.begin_upload(&csv_file("list.csv")).unwrap();
        session
            .complete_upload(ticket, Ok(dataset(&["email", "first_name", "city"])))
            .unwrap();
        session
    }

    #[test]
    fn test_upload_lifecycle() {
        let mut session = Session::default();
        assert!(session.preview().is_none());

        let ticket = session.begin_upload(&csv_file("spring.csv")).unwrap();
        assert_eq!(session.busy(), Some(Operation::Upload));
        assert_eq!(session.options().tag_value, "spring");

        session
            .complete_upload(ticket, Ok(dataset(&["email", "first_name"])))
            .unwrap();
        assert_eq!(session.busy(), None);
        assert_eq!(session.source_name(), Some("spring.csv"));
        assert_eq!(session.columns().len(), 2);
        assert_eq!(session.preview().unwrap().headers, vec!["Name", "Email"]);
    }

    #[test]
    fn test_failed_upload_clears_busy_and_keeps_no_preview() {
        let mut session = Session::default();
        let ticket = session.begin_upload(&csv_file("bad.csv")).unwrap();
        let err = session
            .complete_upload(ticket, Err(PrepError::Application("boom".into())))
            .unwrap_err();
        assert!(matches!(err, PrepError::Application(_)));
        assert_eq!(session.busy(), None);
        assert!(session.preview().is_none());
    }

    #[test]
    fn test_failed_upload_keeps_previous_dataset() {
        let mut session = loaded_session();
        let ticket = session.begin_upload(&csv_file("other.csv")).unwrap();
        let _ = session.complete_upload(ticket, Err(PrepError::Network("down".into())));
        assert_eq!(session.source_name(), Some("list.csv"));
        assert_eq!(session.columns().len(), 3);
    }

    #[test]
    fn test_second_operation_is_rejected() {
        let mut session = loaded_session();
        let _ticket = session.begin_upload(&csv_file("next.csv")).unwrap();

        let err = session.begin_upload(&csv_file("again.csv")).unwrap_err();
        assert!(matches!(err, PrepError::Busy(Operation::Upload)));
        let err = session.begin_download().unwrap_err();
        assert!(matches!(err, PrepError::Busy(Operation::Upload)));
    }

    #[test]
    fn test_column_edits_rejected_during_upload() {
        let mut session = loaded_session();
        let city = session.columns().find_by_original_name("city").unwrap().id();
        let _ticket = session.begin_upload(&csv_file("next.csv")).unwrap();

        let err = session.toggle_included(city).unwrap_err();
        assert!(matches!(err, PrepError::Busy(Operation::Upload)));
    }

    #[test]
    fn test_download_requires_dataset() {
        let mut session = Session::default();
        let err = session.begin_download().unwrap_err();
        assert!(matches!(err, PrepError::Validation(ref m) if m == "Upload a CSV file first"));
        assert_eq!(session.busy(), None);
    }

    #[test]
    fn test_download_lifecycle_leaves_state_untouched() {
        let mut session = loaded_session();
        let city = session.columns().find_by_original_name("city").unwrap().id();
        session.set_included(city, true).unwrap();

        let (ticket, request) = session.begin_download().unwrap();
        assert_eq!(request.columns.len(), 3);
        assert_eq!(request.options.tag_value, "list");
        // Edits during a download only affect the next request
        session.set_display_name(city, "Town").unwrap();

        let before = session.columns().clone();
        let err = session
            .complete_download(ticket, Err(PrepError::Network("timeout".into())))
            .unwrap_err();
        assert!(matches!(err, PrepError::Network(_)));
        assert_eq!(session.busy(), None);
        assert_eq!(session.columns(), &before);
        assert!(session.dataset().is_some());
    }

    #[test]
    fn test_column_proxies() {
        let mut session = loaded_session();
        let city = session.columns().find_by_original_name("city").unwrap().id();

        session
            .set_column_field(city, ColumnField::DisplayName("Town".into()))
            .unwrap();
        assert!(session.move_column(city, -1).unwrap());
        let ids = session.columns().ordered_ids();
        session.reorder(&ids).unwrap();
        assert_eq!(
            session.columns().get(city).unwrap().display_name(),
            "Town"
        );
    }
}
