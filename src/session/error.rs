//! Error types for session persistence.

use std::path::PathBuf;

/// Errors raised while persisting the cookie jar.
///
/// Loading never produces these: a missing or unreadable session file
/// degrades to an empty jar.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No suitable user config directory is available.
    #[error("unable to determine config directory (set XDG_CONFIG_HOME or HOME)")]
    ConfigDirUnavailable,

    /// Filesystem I/O failed while writing the session file.
    #[error("IO error writing session file {path}: {source}")]
    Io {
        /// The file or directory being written.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The cookie store could not be serialized.
    #[error("failed to serialize cookie jar: {0}")]
    Serialize(String),
}

impl SessionError {
    /// Creates an IO error bound to a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
