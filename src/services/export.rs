use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::services::api_client::ApiClient;
use crate::services::session::Session;

/// Runs a download for the current session and saves the file locally
#[derive(Debug, Clone)]
pub struct ExportController {
    client: ApiClient,
}

impl ExportController {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Download with the session's current configuration and save into `dir`.
    pub async fn download_into(&self, session: &mut Session, dir: &Path) -> Result<PathBuf> {
        let (ticket, request) = session.begin_download()?;
        let result = self.client.download(&request).await;
        let file = session.complete_download(ticket, result)?;
        file.save_into(dir)
    }
}
