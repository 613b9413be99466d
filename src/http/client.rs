//! Cookie-aware transport wrapper for portal and CAS requests.
//!
//! Redirects are handled manually unless a request opts in, because the CAS
//! handshake needs to see every `Location` header. Both redirect modes share
//! the same [`SessionJar`], so cookies set while following redirects are
//! visible to manual requests and vice versa.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, LOCATION, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::{Client, Response};
use tracing::{debug, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, MAX_FOLLOWED_REDIRECTS, REQUEST_TIMEOUT_SECS};
use super::error::TransportError;
use crate::session::SessionJar;
use crate::user_agent::DESKTOP_USER_AGENT;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// How a single request treats 3xx responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RedirectMode {
    /// Return 3xx responses to the caller untouched.
    #[default]
    Manual,
    /// Follow redirects and return the final response.
    Follow,
}

/// Per-request options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Redirect handling; manual unless set.
    pub redirect: RedirectMode,
    /// Overrides the default desktop User-Agent.
    pub user_agent: Option<String>,
}

impl RequestOptions {
    /// Options that leave redirects to the caller.
    #[must_use]
    pub fn manual() -> Self {
        Self::default()
    }

    /// Options that follow redirects.
    #[must_use]
    pub fn follow() -> Self {
        Self {
            redirect: RedirectMode::Follow,
            user_agent: None,
        }
    }

    /// Replaces the User-Agent for this request.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// Timeout settings for the portal client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpConfig {
    /// TCP/TLS connect timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout, body included.
    pub request_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

/// HTTP client bound to one cookie jar.
///
/// Cloning is cheap and every clone shares the same jar and connection pools.
/// Nothing here writes the jar to disk; callers decide when to save it.
#[derive(Debug, Clone)]
pub struct HttpClient {
    manual: Client,
    follow: Client,
    jar: Arc<SessionJar>,
}

impl HttpClient {
    /// Creates a client around `jar` with the given timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Build`] if the TLS backend cannot be initialized.
    #[instrument(level = "debug", skip(jar))]
    pub fn new(jar: Arc<SessionJar>, config: HttpConfig) -> Result<Self, TransportError> {
        let manual = build_client(Arc::clone(&jar), config, Policy::none())?;
        let follow = build_client(
            Arc::clone(&jar),
            config,
            Policy::limited(MAX_FOLLOWED_REDIRECTS),
        )?;
        Ok(Self {
            manual,
            follow,
            jar,
        })
    }

    /// Creates a client with an empty jar and default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Build`] if the TLS backend cannot be initialized.
    pub fn with_empty_jar() -> Result<Self, TransportError> {
        Self::new(Arc::new(SessionJar::new()), HttpConfig::default())
    }

    /// The jar attached to every request made through this client.
    #[must_use]
    pub fn jar(&self) -> &Arc<SessionJar> {
        &self.jar
    }

    /// Sends a GET request.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] for invalid URLs and network failures. HTTP
    /// error statuses are returned as responses, not errors.
    #[instrument(level = "debug", skip(self, opts), fields(redirect = ?opts.redirect))]
    pub async fn get(&self, url: &str, opts: &RequestOptions) -> Result<Response, TransportError> {
        let parsed = parse_url(url)?;
        let request = self.client_for(opts.redirect).get(parsed);
        self.send(request, url, opts).await
    }

    /// Sends a form-encoded POST request.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] for invalid URLs and network failures.
    #[instrument(level = "debug", skip(self, fields, opts), fields(redirect = ?opts.redirect))]
    pub async fn post_form(
        &self,
        url: &str,
        fields: &[(&str, &str)],
        opts: &RequestOptions,
    ) -> Result<Response, TransportError> {
        let parsed = parse_url(url)?;
        let request = self
            .client_for(opts.redirect)
            .post(parsed)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(encode_form(fields));
        self.send(request, url, opts).await
    }

    fn client_for(&self, mode: RedirectMode) -> &Client {
        match mode {
            RedirectMode::Manual => &self.manual,
            RedirectMode::Follow => &self.follow,
        }
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
        opts: &RequestOptions,
    ) -> Result<Response, TransportError> {
        let user_agent = opts.user_agent.as_deref().unwrap_or(DESKTOP_USER_AGENT);
        let response = request
            .header(USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(url, e))?;

        debug!(
            scope = "http",
            status = response.status().as_u16(),
            final_url = %response.url(),
            "response received"
        );
        Ok(response)
    }
}

/// Returns the `Location` header of a redirect response, if readable.
#[must_use]
pub fn location_header(response: &Response) -> Option<String> {
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string)
}

fn parse_url(url: &str) -> Result<Url, TransportError> {
    Url::parse(url).map_err(|_| TransportError::invalid_url(url))
}

fn encode_form(fields: &[(&str, &str)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields.iter().copied())
        .finish()
}

fn build_client(
    jar: Arc<SessionJar>,
    config: HttpConfig,
    redirect: Policy,
) -> Result<Client, TransportError> {
    Client::builder()
        .cookie_provider(jar)
        .redirect(redirect)
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .gzip(true)
        .build()
        .map_err(TransportError::Build)
}
