//! Error types for the download module.

use std::path::PathBuf;

use thiserror::Error;

use super::constants::{MAX_CONCURRENCY, MIN_CONCURRENCY};
use crate::http::TransportError;

/// Errors that can occur while fetching a file.
///
/// A non-ok HTTP status is not an error:
/// [`DownloadService::download`](super::DownloadService::download) reports it
/// as `Ok(false)`.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The request or the body stream failed.
    #[error(transparent)]
    Network(#[from] TransportError),

    /// File system error while creating directories or writing the file.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Worker pool size outside the accepted range.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The rejected value.
        value: usize,
    },
}

impl DownloadError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
