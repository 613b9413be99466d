//! Progress reporting hooks for long crawls.

/// Milestones reported while crawling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Started a term.
    Term {
        /// Term id such as `24fall`.
        id: String,
        /// Courses in the term.
        courses: usize,
    },
    /// Started a course.
    Course {
        /// Course display name.
        name: String,
    },
    /// Started a content page.
    Page {
        /// Sidebar category, `None` for top-level links.
        category: Option<String>,
        /// Page title.
        title: String,
    },
    /// Queued a file for download.
    File {
        /// Attachment name.
        name: String,
    },
}

/// Receives crawl milestones. Implementations must be cheap; they run inline.
pub trait ProgressReporter: Send + Sync {
    /// Called once per milestone, in crawl order.
    fn report(&self, event: ProgressEvent);
}

/// Reporter that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}
