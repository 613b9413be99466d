//! Concurrent file downloads into the local vault.
//!
//! - [`DownloadService`] streams files to disk with a bounded worker pool
//! - [`sanitize_filename`] turns portal titles into safe path segments
//!
//! Partial batch failure is a normal outcome: failed items are counted and
//! reported, and nothing is retried.

pub mod constants;
mod error;
mod filename;
mod service;

pub use constants::DEFAULT_CONCURRENCY;
pub use error::DownloadError;
pub use filename::{numbered_segment, sanitize_filename};
pub use service::{DownloadService, DownloadStats, DownloadTask};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
