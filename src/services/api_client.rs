use std::path::{Path, PathBuf};
use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ApiConfig;
use crate::core::{Dataset, DownloadRequest, RawRow};
use crate::error::{GENERIC_NETWORK_ERROR, PrepError, Result};
use crate::services::intake::CsvFile;

/// File name used when the server does not provide one.
pub const DEFAULT_DOWNLOAD_NAME: &str = "processed.csv";

lazy_static! {
    static ref FILENAME_PARAM: Regex =
        Regex::new(r#"(?i)(?:^|;)\s*filename\s*=\s*(?:"([^"]*)"|([^;\s]+))"#)
            .expect("valid filename regex");
    // RFC 5987 form: filename*=<charset>'<lang>'<percent-encoded>
    static ref FILENAME_EXT_PARAM: Regex =
        Regex::new(r"(?i)(?:^|;)\s*filename\*\s*=\s*[^';\s]*'[^']*'([^;\s]+)")
            .expect("valid filename* regex");
}

#[derive(Debug, Deserialize)]
struct UploadBody {
    headers: Vec<String>,
    #[serde(default)]
    data: Vec<Value>,
}

/// A processed file returned by the download endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl DownloadedFile {
    /// Write the file into `dir`, keeping only the last component of the
    /// server-provided name.
    pub fn save_into(&self, dir: &Path) -> Result<PathBuf> {
        let name = self
            .file_name
            .rsplit(['/', '\\'])
            .next()
            .filter(|n| !n.is_empty() && *n != "." && *n != "..")
            .unwrap_or(DEFAULT_DOWNLOAD_NAME);
        std::fs::create_dir_all(dir)?;
        let path = dir.join(name);
        std::fs::write(&path, &self.bytes)?;
        info!("Saved {} bytes to {}", self.bytes.len(), path.display());
        Ok(path)
    }
}

/// HTTP adapter for the `/upload` and `/download` endpoints
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let http = builder.build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Send a CSV file and parse the `{headers, data}` reply.
    pub async fn upload(&self, file: &CsvFile) -> Result<Dataset> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str("text/csv")?;
        let form = Form::new().part("file", part);

        info!("Uploading {} ({} bytes)", file.file_name, file.bytes.len());
        let response = self
            .http
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(failure_from_response(response).await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| PrepError::Network(format!("Invalid upload response: {e}")))?;
        if let Some(message) = error_message(&body) {
            warn!("Upload rejected by server: {}", message);
            return Err(PrepError::Application(message));
        }

        let body: UploadBody = serde_json::from_value(body)
            .map_err(|e| PrepError::Network(format!("Invalid upload response: {e}")))?;
        let rows = body
            .data
            .into_iter()
            .map(|row| match row {
                Value::Object(map) => RawRow::from_json(map),
                _ => RawRow::default(),
            })
            .collect();
        let dataset = Dataset::new(body.headers, rows);
        debug!(
            "Upload returned {} headers and {} rows",
            dataset.headers().len(),
            dataset.row_count()
        );
        Ok(dataset)
    }

    /// Ask the server for the reshaped file.
    pub async fn download(&self, request: &DownloadRequest) -> Result<DownloadedFile> {
        let form = request
            .form_fields()?
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value));

        info!("Requesting download of {} columns", request.columns.len());
        let response = self
            .http
            .post(self.endpoint("download"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(failure_from_response(response).await);
        }

        let file_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| DEFAULT_DOWNLOAD_NAME.to_string());
        let bytes = response.bytes().await?.to_vec();
        debug!("Downloaded {} ({} bytes)", file_name, bytes.len());
        Ok(DownloadedFile { file_name, bytes })
    }
}

/// Extract the server's `error` field when it carries a message.
pub fn error_message(body: &Value) -> Option<String> {
    match body.get("error")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Map a non-2xx reply to `Application` when it carries `{error}`, else to
/// the generic network failure.
pub fn failure_from_body(status: u16, body: &str) -> PrepError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .as_ref()
        .and_then(error_message);
    match message {
        Some(message) => {
            warn!("Server returned {}: {}", status, message);
            PrepError::Application(message)
        }
        None => {
            warn!("Server returned {} without an error body", status);
            PrepError::Network(GENERIC_NETWORK_ERROR.to_string())
        }
    }
}

async fn failure_from_response(response: Response) -> PrepError {
    let status = response.status().as_u16();
    match response.text().await {
        Ok(body) => failure_from_body(status, &body),
        Err(e) => PrepError::from(e),
    }
}

/// Read the file name of a `Content-Disposition` header.
///
/// `filename*` wins over `filename` when both are present.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    let extended = FILENAME_EXT_PARAM
        .captures(header)
        .and_then(|c| c.get(1))
        .and_then(|m| urlencoding::decode(m.as_str()).ok())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());
    if extended.is_some() {
        return extended;
    }
    FILENAME_PARAM
        .captures(header)
        .and_then(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_filename_from_disposition() {
        assert_eq!(
            filename_from_disposition("attachment; filename=processed_data.csv"),
            Some("processed_data.csv".to_string())
        );
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="list final.csv""#),
            Some("list final.csv".to_string())
        );
        assert_eq!(
            filename_from_disposition(r#"attachment; FILENAME="a.csv"; size=10"#),
            Some("a.csv".to_string())
        );
        assert_eq!(filename_from_disposition("attachment"), None);
        assert_eq!(filename_from_disposition(r#"attachment; filename="""#), None);
    }

    #[test]
    fn test_quoted_filename_keeps_semicolons() {
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="a;b.csv""#),
            Some("a;b.csv".to_string())
        );
    }

    #[test]
    fn test_extended_filename_is_decoded_and_preferred() {
        assert_eq!(
            filename_from_disposition("attachment; filename*=UTF-8''my%20list.csv"),
            Some("my list.csv".to_string())
        );
        assert_eq!(
            filename_from_disposition(
                r#"attachment; filename="fallback.csv"; filename*=UTF-8''caf%C3%A9.csv"#
            ),
            Some("café.csv".to_string())
        );
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message(&json!({"error": "Bad file"})),
            Some("Bad file".to_string())
        );
        assert_eq!(error_message(&json!({"error": ""})), None);
        assert_eq!(error_message(&json!({"error": null})), None);
        assert_eq!(error_message(&json!({"headers": []})), None);
        assert_eq!(error_message(&json!({"error": 42})), Some("42".to_string()));
    }

    #[test]
    fn test_failure_from_body() {
        let err = failure_from_body(400, r#"{"error": "No file part"}"#);
        assert!(matches!(err, PrepError::Application(ref m) if m == "No file part"));

        let err = failure_from_body(500, "<html>Internal Server Error</html>");
        assert!(matches!(err, PrepError::Network(ref m) if m == GENERIC_NETWORK_ERROR));

        let err = failure_from_body(502, r#"{"detail": "gateway"}"#);
        assert!(matches!(err, PrepError::Network(_)));
    }

    #[test]
    fn test_save_into_strips_directories() {
        let dir = TempDir::new().unwrap();
        let file = DownloadedFile {
            file_name: "../../etc/contacts.csv".to_string(),
            bytes: b"Name,Email\n".to_vec(),
        };
        let path = file.save_into(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("contacts.csv"));
        assert_eq!(std::fs::read(&path).unwrap(), b"Name,Email\n");
    }

    #[test]
    fn test_save_into_falls_back_to_default_name() {
        let dir = TempDir::new().unwrap();
        let file = DownloadedFile {
            file_name: "..".to_string(),
            bytes: Vec::new(),
        };
        let path = file.save_into(dir.path()).unwrap();
        assert_eq!(path, dir.path().join(DEFAULT_DOWNLOAD_NAME));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let config = ApiConfig {
            base_url: "http://localhost:8080/".to_string(),
            timeout_secs: 0,
        };
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.endpoint("upload"), "http://localhost:8080/upload");
    }
}
