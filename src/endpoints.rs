//! Fixed portal and CAS locations.
//!
//! Every URL the crawler touches is derived from two roots: the portal base URL
//! and the CAS login URL. Tests point both at a mock server.

use url::Url;

/// Default Blackboard portal root.
pub const DEFAULT_BASE_URL: &str = "https://bb.sustech.edu.cn";

/// Default CAS login endpoint.
pub const DEFAULT_CAS_LOGIN_URL: &str = "https://cas.sustech.edu.cn/cas/login";

const SERVICE_PATH: &str = "/webapps/login/";
const TAB_ACTION_PATH: &str = "/webapps/portal/execute/tabs/tabAction";
const API_PROBE_PATH: &str = "/learn/api/public/v1/users/me";
const ANNOUNCEMENT_PATH: &str = "/webapps/blackboard/execute/announcement";

/// Errors building endpoint URLs from configuration.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// A configured root is not a valid absolute URL.
    #[error("invalid {field} URL '{value}': {source}")]
    InvalidUrl {
        /// Which configured root failed.
        field: &'static str,
        /// The offending value.
        value: String,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },
}

/// Portal and CAS URLs used by authentication and scraping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalEndpoints {
    base_url: Url,
    cas_login_url: Url,
}

impl Default for PortalEndpoints {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_CAS_LOGIN_URL)
            .expect("default endpoint URLs are valid")
    }
}

impl PortalEndpoints {
    /// Builds endpoints from a portal base URL and a CAS login URL.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::InvalidUrl`] when either value does not parse.
    pub fn new(base_url: &str, cas_login_url: &str) -> Result<Self, EndpointError> {
        let base_url = Url::parse(base_url).map_err(|source| EndpointError::InvalidUrl {
            field: "base",
            value: base_url.to_string(),
            source,
        })?;
        let cas_login_url =
            Url::parse(cas_login_url).map_err(|source| EndpointError::InvalidUrl {
                field: "CAS login",
                value: cas_login_url.to_string(),
                source,
            })?;
        Ok(Self {
            base_url,
            cas_login_url,
        })
    }

    /// Portal root, used to absolutize scraped links.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// CAS login endpoint without query.
    #[must_use]
    pub fn cas_login_url(&self) -> &Url {
        &self.cas_login_url
    }

    /// The service URL CAS issues tickets for.
    #[must_use]
    pub fn service_url(&self) -> Url {
        self.join(SERVICE_PATH)
    }

    /// CAS login URL carrying the service as a query parameter.
    #[must_use]
    pub fn cas_login_with_service(&self) -> Url {
        let mut url = self.cas_login_url.clone();
        url.query_pairs_mut()
            .append_pair("service", self.service_url().as_str());
        url
    }

    /// Protected portal page used to probe the session.
    #[must_use]
    pub fn session_probe_url(&self) -> Url {
        let mut url = self.tab_action_url();
        url.query_pairs_mut().append_pair("tab_tab_group_id", "_1_1");
        url
    }

    /// Secondary REST probe, consulted when the page probe is inconclusive.
    #[must_use]
    pub fn api_probe_url(&self) -> Url {
        self.join(API_PROBE_PATH)
    }

    /// Ajax endpoint that serves the course list module.
    #[must_use]
    pub fn tab_action_url(&self) -> Url {
        self.join(TAB_ACTION_PATH)
    }

    /// Canonical announcement list for a course id such as `_1234_1`.
    #[must_use]
    pub fn announcements_url(&self, course_id: &str) -> Url {
        announcements_url_for(&self.base_url, course_id)
    }

    fn join(&self, path: &str) -> Url {
        join_path(&self.base_url, path)
    }
}

/// Announcement list URL for `course_id` under an arbitrary portal root.
#[must_use]
pub fn announcements_url_for(base: &Url, course_id: &str) -> Url {
    let mut url = join_path(base, ANNOUNCEMENT_PATH);
    url.query_pairs_mut()
        .append_pair("method", "search")
        .append_pair("context", "course_entry")
        .append_pair("course_id", course_id)
        .append_pair("handle", "announcements_entry")
        .append_pair("mode", "view");
    url
}

fn join_path(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    url.set_path(path);
    url.set_query(None);
    url.set_fragment(None);
    url
}
