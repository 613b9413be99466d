//! Full vault crawl: catalog walk, section artifacts and download batches.
//!
//! Layout written under the output directory:
//!
//! ```text
//! {term}/{course}/{category}/{page}/{section}/section.json
//! {term}/{course}/{category}/{page}/{section}/{file}
//! ```
//!
//! Each section's `section.json` is on disk before any of its files are
//! requested. Top-level sidebar links use the category `_root`.

mod error;
mod orchestrator;
mod progress;

pub use error::CrawlError;
pub use orchestrator::{
    CrawlOptions, CrawlOrchestrator, CrawlSummary, DownloadGranularity, ROOT_CATEGORY,
    SECTION_ARTIFACT,
};
pub use progress::{NoopProgress, ProgressEvent, ProgressReporter};
