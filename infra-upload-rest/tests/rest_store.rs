use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::sync::Mutex;

use capture_domain::{
    ConnectivityPort, ConnectivityStatus, DomainError, MediaItem, MediaKind, QuotaPort,
    RemoteRecord, StorageUsage, UploadMetadata, UploadSinkPort,
};
use capture_infra_upload_rest::{HttpConnectivityProbe, RestQuotaSource, RestUploadSink};

#[derive(Default)]
struct StoreState {
    uploads: Mutex<Vec<UploadSeen>>,
    reject_uploads: bool,
}

struct UploadSeen {
    skip_refresh: Option<String>,
    body_len: usize,
    body_preview: String,
}

async fn create_media(
    State(state): State<Arc<StoreState>>,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Json<RemoteRecord>, StatusCode> {
    let mut uploads = state.uploads.lock().await;
    let index = uploads.len();
    uploads.push(UploadSeen {
        skip_refresh: params.get("skip_refresh").cloned(),
        body_len: body.len(),
        body_preview: String::from_utf8_lossy(&body).into_owned(),
    });
    if state.reject_uploads {
        return Err(StatusCode::INSUFFICIENT_STORAGE);
    }
    Ok(Json(RemoteRecord {
        id: format!("remote-{index}"),
        url: Some(format!("https://store.example/media/remote-{index}")),
    }))
}

async fn storage_usage(State(_state): State<Arc<StoreState>>) -> Json<StorageUsage> {
    Json(StorageUsage {
        used_units: 42,
        quota_units: 100,
    })
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn spawn_store(reject_uploads: bool) -> (SocketAddr, Arc<StoreState>) {
    let state = Arc::new(StoreState {
        uploads: Mutex::new(Vec::new()),
        reject_uploads,
    });
    let app = Router::new()
        .route("/media", post(create_media))
        .route("/storage/usage", get(storage_usage))
        .route("/health", get(health))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock store");
    let addr = listener.local_addr().expect("mock store address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock store serve");
    });
    (addr, state)
}

fn metadata() -> UploadMetadata {
    UploadMetadata {
        title: "east wing inspection".to_string(),
        description: "spalling on column c4".to_string(),
        severity_level: 2,
        anomaly_type: "spalling".to_string(),
        anomaly_category: "structural".to_string(),
        author_name: "Ada Lovelace".to_string(),
        author_id: Some("user-1".to_string()),
        device_session_id: "session-123".to_string(),
        location: None,
        voice_note: None,
    }
}

async fn media_file(dir: &tempfile::TempDir) -> MediaItem {
    let path = dir.path().join("c4.jpg");
    tokio::fs::write(&path, vec![0xFF, 0xD8, 0xFF, 0xD9])
        .await
        .expect("write fixture");
    MediaItem {
        uri: path.to_string_lossy().into_owned(),
        kind: MediaKind::Image,
        width: None,
        height: None,
        file_size_bytes: Some(4),
    }
}

#[tokio::test]
async fn upload_posts_the_file_and_parses_the_record() {
    let (addr, state) = spawn_store(false).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let item = media_file(&dir).await;

    let sink = RestUploadSink::new(
        format!("http://{addr}"),
        Duration::from_secs(5),
        Some("token-abc".to_string()),
    );
    let record = sink
        .create(&item, &metadata(), true)
        .await
        .expect("upload should succeed");

    assert_eq!(record.id, "remote-0");

    let uploads = state.uploads.lock().await;
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].skip_refresh.as_deref(), Some("true"));
    assert!(uploads[0].body_len > 0);
    // The multipart body carries the metadata json and the file part.
    assert!(uploads[0].body_preview.contains("device_session_id"));
    assert!(uploads[0].body_preview.contains("c4.jpg"));
}

#[tokio::test]
async fn the_last_item_clears_the_skip_refresh_flag() {
    let (addr, state) = spawn_store(false).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let item = media_file(&dir).await;

    let sink = RestUploadSink::new(format!("http://{addr}"), Duration::from_secs(5), None);
    sink.create(&item, &metadata(), false)
        .await
        .expect("upload should succeed");

    let uploads = state.uploads.lock().await;
    assert_eq!(uploads[0].skip_refresh.as_deref(), Some("false"));
}

#[tokio::test]
async fn a_rejecting_store_maps_to_an_external_service_error() {
    let (addr, _state) = spawn_store(true).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let item = media_file(&dir).await;

    let sink = RestUploadSink::new(format!("http://{addr}"), Duration::from_secs(5), None);
    let result = sink.create(&item, &metadata(), true).await;

    match result {
        Err(DomainError::ExternalService { service, message }) => {
            assert_eq!(service, "media-store");
            assert!(message.contains("507"));
        }
        other => panic!("expected an external service error, got {other:?}"),
    }
}

#[tokio::test]
async fn a_missing_media_file_fails_without_touching_the_store() {
    let (addr, state) = spawn_store(false).await;
    let item = MediaItem {
        uri: "/nonexistent/frame.jpg".to_string(),
        kind: MediaKind::Image,
        width: None,
        height: None,
        file_size_bytes: None,
    };

    let sink = RestUploadSink::new(format!("http://{addr}"), Duration::from_secs(5), None);
    assert!(sink.create(&item, &metadata(), true).await.is_err());
    assert_eq!(state.uploads.lock().await.len(), 0);
}

#[tokio::test]
async fn usage_snapshot_reads_the_counters() {
    let (addr, _state) = spawn_store(false).await;

    let quota = RestQuotaSource::new(format!("http://{addr}"), Duration::from_secs(5), None);
    let usage = quota.usage_snapshot().await.expect("usage should load");
    assert_eq!(
        usage,
        StorageUsage {
            used_units: 42,
            quota_units: 100
        }
    );
}

#[tokio::test]
async fn the_probe_reports_online_against_a_live_store() {
    let (addr, _state) = spawn_store(false).await;
    let probe = HttpConnectivityProbe::new(format!("http://{addr}"), Duration::from_secs(2));
    assert_eq!(probe.status().await, ConnectivityStatus::Online);
}

#[tokio::test]
async fn the_probe_reports_offline_when_nothing_listens() {
    // Bind and immediately drop to get a port with no listener behind it.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe target");
    let addr = listener.local_addr().expect("probe target address");
    drop(listener);

    let probe = HttpConnectivityProbe::new(format!("http://{addr}"), Duration::from_millis(500));
    assert_eq!(probe.status().await, ConnectivityStatus::Offline);
}
