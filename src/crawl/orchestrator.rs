//! Sequential catalog walk with per-page download batches.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::error::CrawlError;
use super::progress::{NoopProgress, ProgressEvent, ProgressReporter};
use crate::auth::AuthClient;
use crate::course::CourseService;
use crate::download::{DownloadService, DownloadTask, numbered_segment, sanitize_filename};
use crate::parser::{Course, FileLink, Link, PageSection};

/// File written into every section directory.
pub const SECTION_ARTIFACT: &str = "section.json";

/// Category segment for sidebar links that precede any heading.
pub const ROOT_CATEGORY: &str = "_root";

/// When queued files are handed to the download pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DownloadGranularity {
    /// After each page's artifacts are written.
    #[default]
    PerPage,
    /// After every page of a course is written.
    PerCourse,
}

/// Crawl settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Vault root.
    pub output_dir: PathBuf,
    /// Download batching.
    pub granularity: DownloadGranularity,
    /// Remove each requested term directory before crawling it.
    pub clean: bool,
}

impl CrawlOptions {
    /// Options writing into `output_dir` with default batching.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            granularity: DownloadGranularity::default(),
            clean: false,
        }
    }
}

/// Counters returned by [`CrawlOrchestrator::crawl`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    /// Terms visited.
    pub terms: usize,
    /// Courses visited.
    pub courses: usize,
    /// Pages parsed.
    pub pages: usize,
    /// Section artifacts written.
    pub sections: usize,
    /// Files downloaded.
    pub downloaded: usize,
    /// Files that failed.
    pub failed: usize,
    /// Whether the crawl stopped early on request.
    pub cancelled: bool,
}

/// JSON written per section.
#[derive(Debug, Serialize)]
struct SectionArtifact<'a> {
    description: &'a str,
    files: &'a [FileLink],
}

/// Walks term, course, category, page and section, writing artifacts and
/// scheduling downloads.
///
/// Everything except the download batches runs one request at a time.
pub struct CrawlOrchestrator {
    auth: AuthClient,
    courses: CourseService,
    downloads: DownloadService,
    options: CrawlOptions,
    progress: Arc<dyn ProgressReporter>,
    cancel: CancellationToken,
}

impl CrawlOrchestrator {
    /// Creates an orchestrator. The services must share `auth`'s client.
    #[must_use]
    pub fn new(
        auth: AuthClient,
        courses: CourseService,
        downloads: DownloadService,
        options: CrawlOptions,
    ) -> Self {
        Self {
            auth,
            courses,
            downloads,
            options,
            progress: Arc::new(NoopProgress),
            cancel: CancellationToken::new(),
        }
    }

    /// Reports milestones to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Stops at the next boundary once `cancel` fires.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Crawls `terms`, or every term in the catalog when `terms` is empty.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Auth`] when no session can be established,
    /// [`CrawlError::Transport`] when the catalog cannot be fetched, and
    /// [`CrawlError::FileSystem`] when `clean` cannot remove a term
    /// directory. Section write failures are logged and skipped.
    /// Cancellation is not an error.
    #[instrument(skip(self), fields(output = %self.options.output_dir.display()))]
    pub async fn crawl(&mut self, terms: &[String]) -> Result<CrawlSummary, CrawlError> {
        let mut summary = CrawlSummary::default();
        if self.stop_requested(&mut summary) {
            return Ok(summary);
        }

        self.auth.ensure_session().await?;
        let catalog = self.courses.list_courses().await?;
        info!(scope = "crawl", terms = catalog.len(), "course catalog loaded");

        let requested: Vec<String> = if terms.is_empty() {
            catalog.term_ids().map(str::to_string).collect()
        } else {
            terms.to_vec()
        };

        for term_id in &requested {
            if self.stop_requested(&mut summary) {
                return Ok(summary);
            }
            let Some(courses) = catalog.get(term_id) else {
                warn!(scope = "crawl", term = %term_id, "term not in catalog, skipping");
                continue;
            };

            let term_dir = self.options.output_dir.join(sanitize_filename(term_id));
            if self.options.clean {
                remove_dir_if_present(&term_dir).await?;
            }

            summary.terms += 1;
            self.progress.report(ProgressEvent::Term {
                id: term_id.clone(),
                courses: courses.len(),
            });

            for course in courses {
                if self.stop_requested(&mut summary) {
                    return Ok(summary);
                }
                self.crawl_course(course, &term_dir, &mut summary).await?;
                if summary.cancelled {
                    return Ok(summary);
                }
            }
        }

        info!(
            scope = "crawl",
            terms = summary.terms,
            courses = summary.courses,
            pages = summary.pages,
            sections = summary.sections,
            downloaded = summary.downloaded,
            failed = summary.failed,
            "crawl complete"
        );
        Ok(summary)
    }

    async fn crawl_course(
        &self,
        course: &Course,
        term_dir: &Path,
        summary: &mut CrawlSummary,
    ) -> Result<(), CrawlError> {
        summary.courses += 1;
        self.progress.report(ProgressEvent::Course {
            name: course.name.clone(),
        });

        let sidebar = match self.courses.get_sidebar(&course.url).await {
            Ok(sidebar) => sidebar,
            Err(error) => {
                warn!(
                    scope = "crawl",
                    course = %course.name,
                    %error,
                    "sidebar unavailable, skipping course"
                );
                return Ok(());
            }
        };
        if sidebar.is_empty() {
            warn!(scope = "crawl", course = %course.name, "empty sidebar, skipping course");
            return Ok(());
        }

        let course_dir = term_dir.join(sanitize_filename(&course.name));
        let pages = sidebar
            .top_level
            .iter()
            .map(|link| (None, link))
            .chain(sidebar.categories.iter().flat_map(|category| {
                category
                    .links
                    .iter()
                    .map(move |link| (Some(category.title.as_str()), link))
            }));

        let mut queue = Vec::new();
        for (category, link) in pages {
            if self.stop_requested(summary) {
                return Ok(());
            }
            let category_dir = course_dir.join(category.map_or_else(
                || ROOT_CATEGORY.to_string(),
                sanitize_filename,
            ));
            self.crawl_page(category, link, &category_dir, &mut queue, summary)
                .await?;

            if self.options.granularity == DownloadGranularity::PerPage {
                self.run_downloads(std::mem::take(&mut queue), summary).await;
                if summary.cancelled {
                    return Ok(());
                }
            }
        }

        self.run_downloads(queue, summary).await;
        Ok(())
    }

    async fn crawl_page(
        &self,
        category: Option<&str>,
        link: &Link,
        category_dir: &Path,
        queue: &mut Vec<DownloadTask>,
        summary: &mut CrawlSummary,
    ) -> Result<(), CrawlError> {
        self.progress.report(ProgressEvent::Page {
            category: category.map(str::to_string),
            title: link.title.clone(),
        });

        let sections = match self.courses.get_page(&link.url).await {
            Ok(sections) => sections,
            Err(error) => {
                warn!(scope = "crawl", page = %link.title, %error, "page unavailable, skipping");
                return Ok(());
            }
        };
        summary.pages += 1;
        if sections.is_empty() {
            debug!(scope = "crawl", page = %link.title, "page has no downloadable sections");
            return Ok(());
        }

        let page_dir = category_dir.join(sanitize_filename(&link.title));
        for (section, segment) in sections.iter().zip(section_segments(&sections)) {
            let section_dir = page_dir.join(segment);
            if let Err(error) = write_section_artifact(&section_dir, section).await {
                warn!(
                    scope = "crawl",
                    section = %section.title,
                    %error,
                    "section not written, skipping"
                );
                continue;
            }
            summary.sections += 1;

            for file in &section.files {
                self.progress.report(ProgressEvent::File {
                    name: file.name.clone(),
                });
                queue.push(DownloadTask::new(
                    file.url.clone(),
                    section_dir.join(sanitize_filename(&file.name)),
                ));
            }
        }
        Ok(())
    }

    async fn run_downloads(&self, queue: Vec<DownloadTask>, summary: &mut CrawlSummary) {
        if queue.is_empty() {
            return;
        }
        let stats = self
            .downloads
            .download_all_until(queue, &self.cancel, |task| {
                warn!(
                    scope = "crawl",
                    url = %task.url,
                    path = %task.path.display(),
                    "download failed"
                );
            })
            .await;
        summary.downloaded += stats.completed();
        summary.failed += stats.failed();
        if stats.skipped() > 0 {
            summary.cancelled = true;
        }
    }

    fn stop_requested(&self, summary: &mut CrawlSummary) -> bool {
        if self.cancel.is_cancelled() {
            if !summary.cancelled {
                info!(scope = "crawl", "crawl cancelled");
            }
            summary.cancelled = true;
        }
        summary.cancelled
    }
}

/// Directory names for a page's sections. Repeated titles get ` (2)`, ` (3)`, ...
fn section_segments(sections: &[PageSection]) -> Vec<String> {
    let mut used = HashSet::new();
    sections
        .iter()
        .map(|section| {
            let base = sanitize_filename(&section.title);
            let mut segment = base.clone();
            let mut n = 1;
            while !used.insert(segment.to_lowercase()) {
                n += 1;
                segment = numbered_segment(&base, n);
            }
            segment
        })
        .collect()
}

/// Writes `section.json` into `section_dir`, creating it first.
async fn write_section_artifact(
    section_dir: &Path,
    section: &PageSection,
) -> Result<(), CrawlError> {
    tokio::fs::create_dir_all(section_dir)
        .await
        .map_err(|e| CrawlError::file_system(section_dir, e))?;

    let path = section_dir.join(SECTION_ARTIFACT);
    let artifact = SectionArtifact {
        description: &section.text,
        files: &section.files,
    };
    let json = serde_json::to_vec_pretty(&artifact).map_err(|source| CrawlError::Json {
        path: path.clone(),
        source,
    })?;
    tokio::fs::write(&path, json)
        .await
        .map_err(|e| CrawlError::file_system(&path, e))?;
    debug!(scope = "crawl", path = %path.display(), "section artifact written");
    Ok(())
}

async fn remove_dir_if_present(dir: &Path) -> Result<(), CrawlError> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {
            info!(scope = "crawl", dir = %dir.display(), "removed previous term directory");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CrawlError::file_system(dir, e)),
    }
}
