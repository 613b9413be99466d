//! Constants for the download module.

/// Smallest accepted worker pool size.
pub const MIN_CONCURRENCY: usize = 1;

/// Largest accepted worker pool size.
pub const MAX_CONCURRENCY: usize = 32;

/// Concurrent transfers when the caller does not choose.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Longest path segment the sanitizer emits, in UTF-8 bytes.
pub const MAX_SEGMENT_BYTES: usize = 255;
