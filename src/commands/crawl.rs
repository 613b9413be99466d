//! `crawl`: mirror terms into the vault.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bb_vault::{
    CourseService, CrawlOptions, CrawlOrchestrator, CrawlSummary, DownloadGranularity,
    DownloadService,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::build_auth_client;
use crate::config::Settings;
use crate::progress::progress_reporter;

/// Command-line overrides for a crawl.
#[derive(Debug, Clone, Default)]
pub struct CrawlArgs {
    pub terms: Vec<String>,
    pub output: Option<PathBuf>,
    pub concurrency: Option<u8>,
    pub per_course: bool,
    pub clean: bool,
}

impl CrawlArgs {
    fn options(&self, settings: &Settings) -> CrawlOptions {
        let mut options =
            CrawlOptions::new(self.output.clone().unwrap_or_else(|| settings.output_dir.clone()));
        if self.per_course {
            options.granularity = DownloadGranularity::PerCourse;
        }
        options.clean = self.clean;
        options
    }

    fn concurrency(&self, settings: &Settings) -> usize {
        self.concurrency
            .map_or(settings.concurrency, usize::from)
    }

    /// Terms from the command line, else from the config. Empty means all.
    fn terms(&self, settings: &Settings) -> Vec<String> {
        if self.terms.is_empty() {
            settings.terms.clone()
        } else {
            self.terms.clone()
        }
    }
}

pub async fn run_crawl_command(
    settings: &Settings,
    username: Option<String>,
    args: &CrawlArgs,
    use_spinner: bool,
    cancel: CancellationToken,
) -> Result<()> {
    let auth = build_auth_client(settings, username)?;
    let client = auth.http_client();

    let mut courses = CourseService::new(client.clone(), settings.endpoints.clone());
    if let Some(dir) = &settings.debug_dump_dir {
        courses = courses.with_debug_dump(dir);
    }
    let downloads = DownloadService::new(client, args.concurrency(settings))
        .context("Invalid download concurrency")?;
    let options = args.options(settings);
    let output_dir = options.output_dir.clone();

    let (reporter, spinner) = progress_reporter(use_spinner);
    let mut orchestrator = CrawlOrchestrator::new(auth, courses, downloads, options)
        .with_progress(reporter)
        .with_cancellation(cancel);

    let terms = args.terms(settings);
    let term_label = if terms.is_empty() {
        "all".to_string()
    } else {
        terms.join(",")
    };
    info!(output = %output_dir.display(), terms = %term_label, "Crawl starting");
    let result = orchestrator.crawl(&terms).await;
    if let Some(spinner) = spinner {
        spinner.finish();
    }

    let summary = result.context("Crawl failed")?;
    report_summary(&summary);
    Ok(())
}

fn report_summary(summary: &CrawlSummary) {
    info!(
        terms = summary.terms,
        courses = summary.courses,
        pages = summary.pages,
        sections = summary.sections,
        downloaded = summary.downloaded,
        failed = summary.failed,
        "Crawl finished"
    );
    if summary.failed > 0 {
        warn!(failed = summary.failed, "Some files could not be downloaded");
    }
    if summary.cancelled {
        warn!("Crawl interrupted; rerun to continue");
    }
}
