//! HttpBackend against a scripted logbook served by axum on loopback

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use fitsio::FitsFile;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use logbook_common::{NamedRef, TargetPayload};
use logbook_ingest::config::{BackendConfig, IngestConfig};
use logbook_ingest::module::names::LookupTables;
use logbook_ingest::module::sync::{HttpBackend, LogbookBackend, UploadOutcome};
use logbook_ingest::{IngestError, Pipeline, RunRequest, SyncError};

const EXPECTED_AUTH: &str = "Basic dXNlcjpzZWNyZXQ=";

#[derive(Clone, Default)]
struct Logbook {
    received: Arc<Mutex<Vec<Value>>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == EXPECTED_AUTH)
        .unwrap_or(false)
}

async fn telescope_stats(Path(telescope): Path<String>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "no credentials"})));
    }
    match telescope.as_str() {
        "T60" => (
            StatusCode::OK,
            Json(json!({"last_datetime": "2021-05-01T00:00:00Z", "counts": 12})),
        ),
        "Empty Scope" => (StatusCode::OK, Json(json!({"last_datetime": null, "counts": 0}))),
        "Slow" => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            (StatusCode::OK, Json(json!({"last_datetime": null, "counts": 0})))
        }
        _ => (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))),
    }
}

async fn upload_target(
    State(logbook): State<Logbook>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "no credentials"})));
    }
    logbook.received.lock().unwrap().push(body.clone());
    if body["name"] == "BAD" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"non_field_errors": ["The fields datetime_start, telescope must make a unique set."]})),
        );
    }
    (StatusCode::CREATED, Json(body))
}

async fn serve(logbook: Logbook) -> String {
    let app = Router::new()
        .route("/telescope_stats/{telescope}", get(telescope_stats))
        .route("/targets/", post(upload_target))
        .with_state(logbook);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn backend_config(base: &str) -> BackendConfig {
    let mut config = BackendConfig::new(
        &format!("{}/targets/", base),
        &format!("{}/telescope_stats/", base),
        "user",
        "secret",
    );
    config.timeout_secs = 1;
    config
}

/// Address nobody listens on
async fn dead_address() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn payload(name: &str) -> TargetPayload {
    let start = chrono::NaiveDate::from_ymd_opt(2021, 6, 1)
        .unwrap()
        .and_hms_opt(21, 0, 0)
        .unwrap();
    TargetPayload {
        name: name.to_string(),
        datetime_start: start,
        datetime_end: start + chrono::Duration::minutes(30),
        observers: vec![NamedRef::from("JK")],
        colorfilters: vec![NamedRef::from("R")],
        total_exposure_time: 600.0,
        number_of_frames: 10,
        telescope: "T60".to_string(),
    }
}

#[tokio::test]
async fn test_fetch_checkpoint() {
    let base = serve(Logbook::default()).await;
    let backend = HttpBackend::new(backend_config(&base)).unwrap();

    let checkpoint = backend.fetch_checkpoint("T60").await.unwrap();
    assert_eq!(checkpoint.count, 12);
    assert_eq!(
        checkpoint.last_datetime.map(|d| d.to_string()).as_deref(),
        Some("2021-05-01 00:00:00")
    );

    let empty = backend.fetch_checkpoint("Empty Scope").await.unwrap();
    assert_eq!(empty.last_datetime, None);
}

#[tokio::test]
async fn test_fetch_checkpoint_unknown_telescope_is_status_error() {
    let base = serve(Logbook::default()).await;
    let backend = HttpBackend::new(backend_config(&base)).unwrap();

    let err = backend.fetch_checkpoint("Nope").await.unwrap_err();
    assert!(matches!(err, SyncError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_wrong_credentials_are_rejected_by_backend() {
    let base = serve(Logbook::default()).await;
    let mut config = backend_config(&base);
    config.password = "wrong".to_string();
    let backend = HttpBackend::new(config).unwrap();

    let err = backend.fetch_checkpoint("T60").await.unwrap_err();
    assert!(matches!(err, SyncError::Status { status: 401, .. }));
}

#[tokio::test]
async fn test_checkpoint_timeout_is_transport_error() {
    let base = serve(Logbook::default()).await;
    let backend = HttpBackend::new(backend_config(&base)).unwrap();

    let err = backend.fetch_checkpoint("Slow").await.unwrap_err();
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_upload_accepted_and_rejected() {
    let logbook = Logbook::default();
    let base = serve(logbook.clone()).await;
    let backend = HttpBackend::new(backend_config(&base)).unwrap();

    let accepted = backend.upload(&payload("M31")).await.unwrap();
    assert_eq!(accepted, UploadOutcome::Accepted { status: 201 });

    match backend.upload(&payload("BAD")).await.unwrap() {
        UploadOutcome::Rejected { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("unique set"));
        }
        other => panic!("expected rejection, got {:?}", other),
    }

    let received = logbook.received.lock().unwrap();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0]["name"], "M31");
    assert_eq!(received[0]["datetime_start"], "2021-06-01T21:00:00");
    assert_eq!(received[0]["colorfilters"][0]["name"], "R");
    assert_eq!(received[0]["number_of_frames"], 10);
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let base = dead_address().await;
    let mut config = backend_config(&base);
    config.retry_attempts = 2;
    config.retry_delay_secs = 0;
    let backend = HttpBackend::new(config).unwrap();

    assert!(backend.fetch_checkpoint("T60").await.unwrap_err().is_transport());
    assert!(backend.upload(&payload("M31")).await.unwrap_err().is_transport());
}

fn write_frame(dir: &std::path::Path, file: &str, time: &str, object: &str) {
    std::fs::create_dir_all(dir).unwrap();
    let mut fptr = FitsFile::create(dir.join(file)).open().unwrap();
    let hdu = fptr.primary_hdu().unwrap();
    for (key, value) in [
        ("DATE-OBS", "2021-06-01"),
        ("TIME-OBS", time),
        ("OBJECT", object),
        ("OBSERVER", "JK"),
        ("FILTER", "R"),
    ] {
        hdu.write_key(&mut fptr, key, value).unwrap();
    }
    hdu.write_key(&mut fptr, "EXPTIME", 30.0).unwrap();
}

#[tokio::test]
async fn test_pipeline_over_http_continues_after_rejection() {
    let logbook = Logbook::default();
    let base = serve(logbook.clone()).await;
    let backend = HttpBackend::new(backend_config(&base)).unwrap();
    let config = IngestConfig::new(backend_config(&base));
    let tables = LookupTables::default();

    let root = TempDir::new().unwrap();
    let night = root.path().join("2021-06-02");
    write_frame(&night, "1.fits", "20:00:00.0", "BAD");
    write_frame(&night, "2.fits", "21:00:00.0", "M31");
    write_frame(&night, "3.fits", "21:10:00.0", "M31");

    let request = RunRequest {
        telescope_name: "T60".to_string(),
        data_dir: root.path().to_path_buf(),
        datetime_start: None,
        datetime_end: None,
    };
    let report = Pipeline::new(&config, &backend, &tables)
        .run(&request)
        .await
        .unwrap();

    assert_eq!(report.targets_rejected, 1);
    assert_eq!(report.targets_accepted, 1);

    let received = logbook.received.lock().unwrap();
    let names: Vec<_> = received.iter().map(|v| v["name"].as_str().unwrap().to_string()).collect();
    assert_eq!(names, vec!["BAD", "M31"]);
    assert_eq!(received[1]["number_of_frames"], 2);
    assert_eq!(received[1]["total_exposure_time"], 60.0);
}

#[tokio::test]
async fn test_pipeline_aborts_without_backend() {
    let base = dead_address().await;
    let backend = HttpBackend::new(backend_config(&base)).unwrap();
    let config = IngestConfig::new(backend_config(&base));
    let tables = LookupTables::default();
    let root = TempDir::new().unwrap();

    let request = RunRequest {
        telescope_name: "T60".to_string(),
        data_dir: root.path().to_path_buf(),
        datetime_start: None,
        datetime_end: None,
    };
    let result = Pipeline::new(&config, &backend, &tables).run(&request).await;
    assert!(matches!(result, Err(IngestError::Sync(e)) if e.is_transport()));
}
