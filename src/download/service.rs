//! Bounded-concurrency file fetcher.
//!
//! Each [`DownloadTask`] runs in its own Tokio task once a semaphore permit is
//! free. Tasks are independent: one failure is reported through the caller's
//! callback and never stops its siblings.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::constants::{DEFAULT_CONCURRENCY, MAX_CONCURRENCY, MIN_CONCURRENCY};
use super::error::DownloadError;
use crate::http::{HttpClient, RequestOptions, TransportError};

/// One file to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    /// Absolute source URL.
    pub url: String,
    /// Destination file, already sanitized.
    pub path: PathBuf,
}

impl DownloadTask {
    /// Creates a task.
    pub fn new(url: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            path: path.into(),
        }
    }
}

/// Outcome counts for one [`DownloadService::download_all`] batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadStats {
    completed: usize,
    failed: usize,
    skipped: usize,
}

impl DownloadStats {
    /// Files written to disk.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Items that answered a non-ok status or errored.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Items never started because the batch was cancelled.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Items that ran (completed + failed).
    #[must_use]
    pub fn total(&self) -> usize {
        self.completed + self.failed
    }
}

/// Streams files to disk through the shared portal session.
///
/// Workers hold a clone of the [`HttpClient`] and only read the session
/// cookies; they never authenticate.
#[derive(Debug, Clone)]
pub struct DownloadService {
    client: HttpClient,
    semaphore: Arc<Semaphore>,
    concurrency: usize,
}

impl DownloadService {
    /// Creates a service with `concurrency` simultaneous transfers.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidConcurrency`] outside `1..=32`.
    #[instrument(level = "debug", skip(client))]
    pub fn new(client: HttpClient, concurrency: usize) -> Result<Self, DownloadError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(DownloadError::InvalidConcurrency { value: concurrency });
        }
        Ok(Self {
            client,
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
        })
    }

    /// Creates a service with the default pool size.
    #[must_use]
    pub fn with_default_concurrency(client: HttpClient) -> Self {
        Self {
            client,
            semaphore: Arc::new(Semaphore::new(DEFAULT_CONCURRENCY)),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Configured pool size.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Fetches `url` into `path`, following redirects.
    ///
    /// Returns `Ok(false)` without creating the file when the server answers
    /// with a non-ok status. A partially written file is removed on error.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] on transport, stream or file system failures.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn download(&self, url: &str, path: &Path) -> Result<bool, DownloadError> {
        fetch_to_file(&self.client, url, path).await
    }

    /// Runs every item through the pool and waits for all of them.
    ///
    /// `on_error` is called exactly once for each item that failed.
    pub async fn download_all<F>(&self, items: Vec<DownloadTask>, on_error: F) -> DownloadStats
    where
        F: FnMut(&DownloadTask),
    {
        self.download_all_until(items, &CancellationToken::new(), on_error)
            .await
    }

    /// Like [`download_all`](Self::download_all), but stops starting new
    /// items once `cancel` fires. Transfers already running finish normally.
    #[instrument(skip_all, fields(items = items.len(), concurrency = self.concurrency))]
    pub async fn download_all_until<F>(
        &self,
        items: Vec<DownloadTask>,
        cancel: &CancellationToken,
        mut on_error: F,
    ) -> DownloadStats
    where
        F: FnMut(&DownloadTask),
    {
        let mut stats = DownloadStats::default();
        let mut handles = Vec::with_capacity(items.len());
        let total = items.len();

        for (index, item) in items.into_iter().enumerate() {
            if cancel.is_cancelled() {
                stats.skipped = total - index;
                debug!(scope = "download", skipped = stats.skipped, "batch cancelled");
                break;
            }

            let permit = tokio::select! {
                permit = Arc::clone(&self.semaphore).acquire_owned() => permit.ok(),
                () = cancel.cancelled() => None,
            };
            let Some(permit) = permit else {
                stats.skipped = total - index;
                debug!(scope = "download", skipped = stats.skipped, "batch stopped");
                break;
            };

            let client = self.client.clone();
            let task = item.clone();
            handles.push((
                item,
                tokio::spawn(async move {
                    let _permit = permit;
                    fetch_to_file(&client, &task.url, &task.path).await
                }),
            ));
        }

        for (item, handle) in handles {
            let succeeded = match handle.await {
                Ok(Ok(true)) => true,
                Ok(Ok(false)) => false,
                Ok(Err(error)) => {
                    warn!(scope = "download", url = %item.url, %error, "download failed");
                    false
                }
                Err(error) => {
                    warn!(scope = "download", url = %item.url, %error, "download task panicked");
                    false
                }
            };
            if succeeded {
                stats.completed += 1;
            } else {
                stats.failed += 1;
                on_error(&item);
            }
        }

        info!(
            scope = "download",
            completed = stats.completed,
            failed = stats.failed,
            skipped = stats.skipped,
            "download batch complete"
        );
        stats
    }
}

async fn fetch_to_file(client: &HttpClient, url: &str, path: &Path) -> Result<bool, DownloadError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DownloadError::io(parent, e))?;
    }

    let response = client.get(url, &RequestOptions::follow()).await?;
    let status = response.status();
    if !status.is_success() {
        warn!(scope = "download", url, status = status.as_u16(), "server refused download");
        return Ok(false);
    }

    let mut file = File::create(path)
        .await
        .map_err(|e| DownloadError::io(path, e))?;

    match stream_to_file(&mut file, response, url, path).await {
        Ok(bytes) => {
            debug!(scope = "download", url, bytes, path = %path.display(), "download complete");
            Ok(true)
        }
        Err(error) => {
            drop(file);
            debug!(scope = "download", path = %path.display(), "removing partial file");
            let _ = tokio::fs::remove_file(path).await;
            Err(error)
        }
    }
}

async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| TransportError::from_reqwest(url, e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;
        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> HttpClient {
        HttpClient::with_empty_jar().unwrap()
    }

    #[test]
    fn test_service_accepts_concurrency_bounds() {
        assert_eq!(DownloadService::new(client(), 1).unwrap().concurrency(), 1);
        assert_eq!(DownloadService::new(client(), 32).unwrap().concurrency(), 32);
        assert_eq!(
            DownloadService::with_default_concurrency(client()).concurrency(),
            DEFAULT_CONCURRENCY
        );
    }

    #[test]
    fn test_service_rejects_out_of_range_concurrency() {
        assert!(matches!(
            DownloadService::new(client(), 0),
            Err(DownloadError::InvalidConcurrency { value: 0 })
        ));
        assert!(matches!(
            DownloadService::new(client(), 33),
            Err(DownloadError::InvalidConcurrency { value: 33 })
        ));
    }

    #[test]
    fn test_download_stats_total() {
        let stats = DownloadStats {
            completed: 3,
            failed: 2,
            skipped: 4,
        };
        assert_eq!(stats.total(), 5);
        assert_eq!(stats.skipped(), 4);
    }

    #[tokio::test]
    async fn test_download_all_cancelled_before_start_skips_everything() {
        let service = DownloadService::with_default_concurrency(client());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let items = vec![
            DownloadTask::new("http://127.0.0.1:9/a", "/nonexistent/a"),
            DownloadTask::new("http://127.0.0.1:9/b", "/nonexistent/b"),
        ];

        let mut failures = 0;
        let stats = service
            .download_all_until(items, &cancel, |_| failures += 1)
            .await;

        assert_eq!(stats.skipped(), 2);
        assert_eq!(stats.total(), 0);
        assert_eq!(failures, 0);
    }
}
