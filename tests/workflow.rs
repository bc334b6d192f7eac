use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tempfile::TempDir;

use sendyprep::config::ApiConfig;
use sendyprep::error::{ErrorKind, GENERIC_NETWORK_ERROR, Operation, PrepError};
use sendyprep::services::{ApiClient, ExportController, IntakeController, Session};

#[derive(Clone, Default)]
struct MockState {
    uploads: Arc<AtomicUsize>,
    downloads: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

async fn upload(State(state): State<MockState>, mut multipart: Multipart) -> Response {
    state.uploads.fetch_add(1, Ordering::SeqCst);
    let mut file_name = String::new();
    let mut body = String::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        if field.name() == Some("file") {
            file_name = field.file_name().unwrap_or_default().to_string();
            body = field.text().await.unwrap();
        }
    }

    match file_name.as_str() {
        "bad.csv" => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Unable to parse CSV" })),
        )
            .into_response(),
        "soft.csv" => Json(json!({ "error": "File is empty" })).into_response(),
        "broken.csv" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        "slow.csv" => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(json!({ "headers": [], "data": [] })).into_response()
        }
        _ => {
            let mut lines = body.lines();
            let headers: Vec<String> = lines
                .next()
                .unwrap_or_default()
                .split(',')
                .map(str::to_string)
                .collect();
            let data: Vec<Value> = lines
                .map(|line| {
                    let row: serde_json::Map<String, Value> = headers
                        .iter()
                        .cloned()
                        .zip(line.split(',').map(|v| json!(v)))
                        .collect();
                    Value::Object(row)
                })
                .collect();
            (
                [(header::SET_COOKIE, "session=abc123; Path=/")],
                Json(json!({ "headers": headers, "data": data })),
            )
                .into_response()
        }
    }
}

async fn download(
    State(state): State<MockState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let mut fields = HashMap::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        fields.insert(name, field.text().await.unwrap());
    }
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    fields.insert("cookie".to_string(), cookie);
    state.downloads.lock().unwrap().push(fields.clone());

    if fields.get("tagName").map(String::as_str) == Some("fail") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid tag name" })),
        )
            .into_response();
    }

    let columns: Vec<Value> = serde_json::from_str(&fields["columns"]).unwrap();
    let mut header_line: Vec<&str> = columns
        .iter()
        .map(|c| c["displayName"].as_str().unwrap())
        .collect();
    header_line.push(&fields["tagName"]);
    let csv = format!("{}\n", header_line.join(","));

    if fields["tagName"] == "plain" {
        return ([(header::CONTENT_TYPE, "text/csv")], csv).into_response();
    }

    (
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"contacts_ready.csv\"",
            ),
        ],
        csv,
    )
        .into_response()
}

async fn spawn_server() -> (String, MockState) {
    let state = MockState::default();
    let app = Router::new()
        .route("/upload", post(upload))
        .route("/download", post(download))
        .with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), state)
}

fn client(base_url: &str, timeout_secs: u64) -> ApiClient {
    ApiClient::new(&ApiConfig {
        base_url: base_url.to_string(),
        timeout_secs,
    })
    .unwrap()
}

fn write_csv(dir: &Path, name: &str, rows: usize) -> PathBuf {
    let mut content = String::from("email,first_name,city\n");
    for i in 0..rows {
        content.push_str(&format!("user{i}@example.com,User{i},Town{i}\n"));
    }
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn upload_builds_configuration_and_preview() {
    let (base, _state) = spawn_server().await;
    let dir = TempDir::new().unwrap();
    let path = write_csv(dir.path(), "contacts.csv", 12);

    let intake = IntakeController::new(client(&base, 10));
    let mut session = Session::default();
    intake.process_file(&mut session, &path).await.unwrap();

    assert_eq!(session.busy(), None);
    assert_eq!(session.options().tag_value, "contacts");
    assert_eq!(session.source_name(), Some("contacts.csv"));

    let grid = session.preview().unwrap();
    assert_eq!(grid.headers, vec!["Name", "Email"]);
    assert_eq!(grid.rows.len(), 10);
    assert_eq!(grid.total_rows, 12);
    assert_eq!(grid.rows[0], vec!["User0", "user0@example.com"]);
}

#[tokio::test]
async fn download_sends_configuration_and_saves_file() {
    let (base, state) = spawn_server().await;
    let dir = TempDir::new().unwrap();
    let path = write_csv(dir.path(), "contacts.csv", 3);
    let api = client(&base, 10);

    let mut session = Session::default();
    IntakeController::new(api.clone())
        .process_file(&mut session, &path)
        .await
        .unwrap();

    let city = session.columns().find_by_original_name("city").unwrap().id();
    session.set_included(city, true).unwrap();
    session.set_display_name(city, "Town").unwrap();
    session.move_column(city, -2).unwrap();
    session.options_mut().remove_empty = true;

    let out = TempDir::new().unwrap();
    let saved = ExportController::new(api)
        .download_into(&mut session, out.path())
        .await
        .unwrap();

    assert_eq!(saved, out.path().join("contacts_ready.csv"));
    assert_eq!(std::fs::read_to_string(&saved).unwrap(), "Town,Name,Email,Tag\n");

    let downloads = state.downloads.lock().unwrap();
    assert_eq!(downloads.len(), 1);
    let fields = &downloads[0];
    let columns: Value = serde_json::from_str(&fields["columns"]).unwrap();
    assert_eq!(
        columns,
        json!([
            { "originalName": "city", "displayName": "Town" },
            { "originalName": "first_name", "displayName": "Name" },
            { "originalName": "email", "displayName": "Email" }
        ])
    );
    assert_eq!(fields["tagName"], "Tag");
    assert_eq!(fields["tagValue"], "contacts");
    assert_eq!(fields["removeDuplicates"], "true");
    assert_eq!(fields["removeEmpty"], "true");
    assert!(fields["cookie"].contains("session=abc123"));
    assert_eq!(session.busy(), None);
}

#[tokio::test]
async fn upload_error_body_on_failure_status() {
    let (base, _state) = spawn_server().await;
    let dir = TempDir::new().unwrap();
    let path = write_csv(dir.path(), "bad.csv", 1);

    let mut session = Session::default();
    let err = IntakeController::new(client(&base, 10))
        .process_file(&mut session, &path)
        .await
        .unwrap_err();

    assert!(matches!(err, PrepError::Application(ref m) if m == "Unable to parse CSV"));
    assert_eq!(
        Operation::Upload.alert(&err),
        "Error processing file: Unable to parse CSV"
    );
    assert_eq!(session.busy(), None);
    assert!(session.preview().is_none());
}

#[tokio::test]
async fn upload_error_body_on_success_status() {
    let (base, _state) = spawn_server().await;
    let dir = TempDir::new().unwrap();
    let path = write_csv(dir.path(), "soft.csv", 1);

    let mut session = Session::default();
    let err = IntakeController::new(client(&base, 10))
        .process_file(&mut session, &path)
        .await
        .unwrap_err();

    assert!(matches!(err, PrepError::Application(ref m) if m == "File is empty"));
    assert!(session.dataset().is_none());
}

#[tokio::test]
async fn upload_plain_server_error_is_generic() {
    let (base, _state) = spawn_server().await;
    let dir = TempDir::new().unwrap();
    let path = write_csv(dir.path(), "broken.csv", 1);

    let mut session = Session::default();
    let err = IntakeController::new(client(&base, 10))
        .process_file(&mut session, &path)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(err.to_string(), GENERIC_NETWORK_ERROR);
}

#[tokio::test]
async fn wrong_file_type_never_reaches_server() {
    let (base, state) = spawn_server().await;
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("contacts.xlsx");
    std::fs::write(&path, "email\n").unwrap();

    let mut session = Session::default();
    let err = IntakeController::new(client(&base, 10))
        .process_file(&mut session, &path)
        .await
        .unwrap_err();

    assert_eq!(Operation::Upload.alert(&err), "Please upload a CSV file");
    assert_eq!(state.uploads.load(Ordering::SeqCst), 0);
    assert_eq!(session.busy(), None);
}

#[tokio::test]
async fn slow_upload_times_out() {
    let (base, _state) = spawn_server().await;
    let dir = TempDir::new().unwrap();
    let path = write_csv(dir.path(), "slow.csv", 1);

    let mut session = Session::default();
    let err = IntakeController::new(client(&base, 1))
        .process_file(&mut session, &path)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(session.busy(), None);
}

#[tokio::test]
async fn download_failure_keeps_session_state() {
    let (base, _state) = spawn_server().await;
    let dir = TempDir::new().unwrap();
    let path = write_csv(dir.path(), "contacts.csv", 2);
    let api = client(&base, 10);

    let mut session = Session::default();
    IntakeController::new(api.clone())
        .process_file(&mut session, &path)
        .await
        .unwrap();
    session.options_mut().tag_name = "fail".to_string();
    let columns_before = session.columns().clone();

    let out = TempDir::new().unwrap();
    let err = ExportController::new(api)
        .download_into(&mut session, out.path())
        .await
        .unwrap_err();

    assert_eq!(
        Operation::Download.alert(&err),
        "Error downloading file: Invalid tag name"
    );
    assert_eq!(session.busy(), None);
    assert_eq!(session.columns(), &columns_before);
    assert!(session.dataset().is_some());
    assert!(std::fs::read_dir(out.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn download_without_disposition_uses_default_name() {
    let (base, _state) = spawn_server().await;
    let dir = TempDir::new().unwrap();
    let path = write_csv(dir.path(), "contacts.csv", 2);
    let api = client(&base, 10);

    let mut session = Session::default();
    IntakeController::new(api.clone())
        .process_file(&mut session, &path)
        .await
        .unwrap();
    session.options_mut().tag_name = "plain".to_string();

    let out = TempDir::new().unwrap();
    let saved = ExportController::new(api)
        .download_into(&mut session, out.path())
        .await
        .unwrap();

    assert_eq!(saved, out.path().join("processed.csv"));
    assert_eq!(std::fs::read_to_string(&saved).unwrap(), "Name,Email,plain\n");
}

#[tokio::test]
async fn unreachable_server_is_network_error() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(dir.path(), "contacts.csv", 1);

    let mut session = Session::default();
    let err = IntakeController::new(client("http://127.0.0.1:1", 5))
        .process_file(&mut session, &path)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(Operation::Upload.alert(&err).starts_with("Error processing file: "));
    assert_eq!(session.busy(), None);
}
