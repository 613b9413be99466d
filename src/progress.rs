//! Terminal spinner for crawl milestones.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bb_vault::{NoopProgress, ProgressEvent, ProgressReporter};
use indicatif::{ProgressBar, ProgressStyle};

/// Spinner that shows the crawl position and a running file count.
pub(crate) struct SpinnerProgress {
    spinner: ProgressBar,
    files: AtomicUsize,
}

impl SpinnerProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        Self {
            spinner,
            files: AtomicUsize::new(0),
        }
    }

    /// Clears the spinner line.
    pub(crate) fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for SpinnerProgress {
    fn report(&self, event: ProgressEvent) {
        let files = match &event {
            ProgressEvent::File { .. } => self.files.fetch_add(1, Ordering::Relaxed) + 1,
            _ => self.files.load(Ordering::Relaxed),
        };
        self.spinner.set_message(format!("[{files} files] {}", describe(&event)));
    }
}

fn describe(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::Term { id, courses } => format!("term {id} ({courses} courses)"),
        ProgressEvent::Course { name } => format!("course {name}"),
        ProgressEvent::Page {
            category: Some(category),
            title,
        } => format!("page {category} / {title}"),
        ProgressEvent::Page {
            category: None,
            title,
        } => format!("page {title}"),
        ProgressEvent::File { name } => format!("queued {name}"),
    }
}

/// Reporter for this run plus the spinner to clear afterwards, if any.
pub(crate) fn progress_reporter(
    use_spinner: bool,
) -> (Arc<dyn ProgressReporter>, Option<Arc<SpinnerProgress>>) {
    if !use_spinner {
        return (Arc::new(NoopProgress), None);
    }
    let spinner = Arc::new(SpinnerProgress::new());
    (Arc::clone(&spinner) as Arc<dyn ProgressReporter>, Some(spinner))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_events() {
        assert_eq!(
            describe(&ProgressEvent::Term {
                id: "24fall".to_string(),
                courses: 3
            }),
            "term 24fall (3 courses)"
        );
        assert_eq!(
            describe(&ProgressEvent::Page {
                category: Some("Course Content".to_string()),
                title: "Lectures".to_string()
            }),
            "page Course Content / Lectures"
        );
        assert_eq!(
            describe(&ProgressEvent::Page {
                category: None,
                title: "Syllabus".to_string()
            }),
            "page Syllabus"
        );
    }

    #[test]
    fn test_spinner_counts_files() {
        let spinner = SpinnerProgress::new();
        spinner.report(ProgressEvent::File {
            name: "a.pdf".to_string(),
        });
        spinner.report(ProgressEvent::Course {
            name: "Compilers".to_string(),
        });
        spinner.report(ProgressEvent::File {
            name: "b.pdf".to_string(),
        });
        assert_eq!(spinner.files.load(Ordering::Relaxed), 2);
        spinner.finish();
    }

    #[test]
    fn test_progress_reporter_without_spinner() {
        let (_reporter, spinner) = progress_reporter(false);
        assert!(spinner.is_none());
    }
}
