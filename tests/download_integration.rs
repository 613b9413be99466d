//! Integration tests for the bounded download pool.
//!
//! These tests verify the full download flow with mock HTTP servers.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bb_vault::{DownloadService, DownloadTask, HttpClient};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> HttpClient {
    HttpClient::with_empty_jar().expect("client builds")
}

#[tokio::test]
async fn test_download_full_flow_preserves_content() {
    let content = b"This is the complete file content for testing.\nLine 2.\nLine 3.";
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bbcswebdav/xid-1_1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .mount(&mock_server)
        .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let service = DownloadService::with_default_concurrency(client());
    let target = temp_dir.path().join("nested/dir/lecture1.pdf");
    let url = format!("{}/bbcswebdav/xid-1_1", mock_server.uri());
    let ok = service.download(&url, &target).await.expect("download runs");

    assert!(ok);
    assert_eq!(std::fs::read(&target).unwrap(), content);
}

#[tokio::test]
async fn test_download_follows_redirects() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bbcswebdav/xid-2_1"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "/storage/real-file.pdf"),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/storage/real-file.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"redirected".to_vec()))
        .mount(&mock_server)
        .await;
    let temp_dir = TempDir::new().unwrap();

    let service = DownloadService::with_default_concurrency(client());
    let target = temp_dir.path().join("file.pdf");
    let ok = service
        .download(&format!("{}/bbcswebdav/xid-2_1", mock_server.uri()), &target)
        .await
        .unwrap();

    assert!(ok);
    assert_eq!(std::fs::read(&target).unwrap(), b"redirected");
}

#[tokio::test]
async fn test_download_error_status_creates_no_file() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    let temp_dir = TempDir::new().unwrap();

    let service = DownloadService::with_default_concurrency(client());
    let target = temp_dir.path().join("missing.pdf");
    let ok = service
        .download(&format!("{}/missing.pdf", mock_server.uri()), &target)
        .await
        .unwrap();

    assert!(!ok);
    assert!(!target.exists());
}

#[tokio::test]
async fn test_download_all_reports_each_failure_once() {
    let mock_server = MockServer::start().await;
    for index in 0..6 {
        let status = if index % 3 == 0 { 500 } else { 200 };
        Mock::given(method("GET"))
            .and(path(format!("/files/{index}.pdf")))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_bytes(format!("payload {index}").into_bytes())
                    .set_delay(Duration::from_millis(20)),
            )
            .mount(&mock_server)
            .await;
    }
    let temp_dir = TempDir::new().unwrap();

    let items: Vec<DownloadTask> = (0..6)
        .map(|index| {
            DownloadTask::new(
                format!("{}/files/{index}.pdf", mock_server.uri()),
                temp_dir.path().join(format!("{index}.pdf")),
            )
        })
        .collect();

    let failures = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&failures);
    let service = DownloadService::new(client(), 2).unwrap();
    let stats = service
        .download_all(items, move |task| {
            sink.lock().unwrap().push(task.path.clone());
        })
        .await;

    assert_eq!(stats.completed(), 4);
    assert_eq!(stats.failed(), 2);
    assert_eq!(stats.skipped(), 0);

    let mut failed = failures.lock().unwrap().clone();
    failed.sort();
    assert_eq!(
        failed,
        vec![temp_dir.path().join("0.pdf"), temp_dir.path().join("3.pdf")]
    );

    for index in [1, 2, 4, 5] {
        let written = std::fs::read(temp_dir.path().join(format!("{index}.pdf"))).unwrap();
        assert_eq!(written, format!("payload {index}").into_bytes());
    }
}

#[tokio::test]
async fn test_download_all_counts_unreachable_host_as_failure() {
    let temp_dir = TempDir::new().unwrap();
    let items = vec![DownloadTask::new(
        "http://127.0.0.1:9/unreachable.pdf",
        temp_dir.path().join("unreachable.pdf"),
    )];

    let mut calls = 0;
    let service = DownloadService::with_default_concurrency(client());
    let stats = service.download_all(items, |_| calls += 1).await;

    assert_eq!(stats.failed(), 1);
    assert_eq!(calls, 1);
    assert!(!temp_dir.path().join("unreachable.pdf").exists());
}
