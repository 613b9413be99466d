//! Error types for the crawl pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::auth::AuthError;
use crate::http::TransportError;

/// Terminal crawl failures.
///
/// Per-item problems (an unreachable page, a failed download) are logged and
/// skipped instead; cancellation is reported through
/// [`CrawlSummary::cancelled`](super::CrawlSummary::cancelled).
#[derive(Debug, Error)]
pub enum CrawlError {
    /// No valid session could be established.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// The course catalog could not be fetched.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Writing the vault failed.
    #[error("file system error at {path}: {source}")]
    FileSystem {
        /// Path that could not be written or removed.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A section artifact could not be serialized.
    #[error("failed to serialize {path}: {source}")]
    Json {
        /// Artifact path.
        path: PathBuf,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

impl CrawlError {
    /// Creates a file system error.
    pub fn file_system(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_is_wrapped_with_context() {
        let error = CrawlError::from(AuthError::InvalidCredentials);
        assert_eq!(
            error.to_string(),
            "authentication failed: CAS rejected the username or password"
        );
    }

    #[test]
    fn test_file_system_error_names_path() {
        let error = CrawlError::file_system(
            "/vault/24fall",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(error.to_string().contains("/vault/24fall"));
    }
}
