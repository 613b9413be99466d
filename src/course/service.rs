//! Tab-action, sidebar and content-page requests with optional raw dumps.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};
use url::Url;

use crate::endpoints::PortalEndpoints;
use crate::http::{HttpClient, RequestOptions, TransportError};
use crate::parser::{
    CoursesByTerm, PageSection, Sidebar, parse_course_list, parse_page, parse_sidebar,
};

/// Dump file name for the raw course-list envelope.
pub const COURSES_DUMP: &str = "courses.xml";
/// Dump file name for the last course entry page.
pub const SIDEBAR_DUMP: &str = "sidebar.html";
/// Dump file name for the last content page.
pub const PAGE_DUMP: &str = "page.html";

const COURSE_LIST_FORM: &[(&str, &str)] = &[
    ("action", "refreshAjaxModule"),
    ("modId", "_3_1"),
    ("tabId", "_1_1"),
    ("tab_tab_group_id", "_1_1"),
];

/// Scraping façade over an authenticated [`HttpClient`].
#[derive(Debug, Clone)]
pub struct CourseService {
    http: HttpClient,
    endpoints: PortalEndpoints,
    dump_dir: Option<PathBuf>,
}

impl CourseService {
    /// Creates a service sharing `http`'s session.
    #[must_use]
    pub fn new(http: HttpClient, endpoints: PortalEndpoints) -> Self {
        Self {
            http,
            endpoints,
            dump_dir: None,
        }
    }

    /// Writes every raw response body into `dir` for inspection.
    #[must_use]
    pub fn with_debug_dump(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dump_dir = Some(dir.into());
        self
    }

    /// Fetches the term and course catalog.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Status`] on a non-200 answer, or the
    /// underlying transport failure.
    #[instrument(skip(self))]
    pub async fn list_courses(&self) -> Result<CoursesByTerm, TransportError> {
        let url = self.endpoints.tab_action_url();
        let response = self
            .http
            .post_form(url.as_str(), COURSE_LIST_FORM, &RequestOptions::manual())
            .await?;
        let (body, _) = read_ok_body(response, url.as_str()).await?;
        self.dump(COURSES_DUMP, &body).await;

        let catalog = parse_course_list(&body, self.endpoints.base_url());
        debug!(scope = "course", terms = catalog.len(), "course list parsed");
        Ok(catalog)
    }

    /// Fetches a course entry page and parses its navigation menu.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Status`] on a non-200 answer, or the
    /// underlying transport failure.
    #[instrument(skip(self))]
    pub async fn get_sidebar(&self, url: &str) -> Result<Sidebar, TransportError> {
        let response = self.http.get(url, &RequestOptions::follow()).await?;
        let (body, final_url) = read_ok_body(response, url).await?;
        self.dump(SIDEBAR_DUMP, &body).await;

        let sidebar = parse_sidebar(&body, &final_url);
        debug!(scope = "course", links = sidebar.link_count(), "sidebar parsed");
        Ok(sidebar)
    }

    /// Fetches a content page and parses its sections.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Status`] on a non-200 answer, or the
    /// underlying transport failure.
    #[instrument(skip(self))]
    pub async fn get_page(&self, url: &str) -> Result<Vec<PageSection>, TransportError> {
        let response = self.http.get(url, &RequestOptions::follow()).await?;
        let (body, final_url) = read_ok_body(response, url).await?;
        self.dump(PAGE_DUMP, &body).await;

        let sections = parse_page(&body, &final_url);
        debug!(scope = "course", sections = sections.len(), "page parsed");
        Ok(sections)
    }

    async fn dump(&self, name: &str, body: &str) {
        let Some(dir) = &self.dump_dir else {
            return;
        };
        if let Err(error) = write_dump(dir, name, body).await {
            warn!(scope = "course", dir = %dir.display(), %error, "could not write debug dump");
        }
    }
}

async fn read_ok_body(
    response: reqwest::Response,
    url: &str,
) -> Result<(String, Url), TransportError> {
    let status = response.status().as_u16();
    if status != 200 {
        return Err(TransportError::status(url, status));
    }
    let final_url = response.url().clone();
    let body = response
        .text()
        .await
        .map_err(|e| TransportError::from_reqwest(url, e))?;
    Ok((body, final_url))
}

async fn write_dump(dir: &Path, name: &str, body: &str) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(dir.join(name), body).await
}
