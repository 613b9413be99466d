//! CAS single-sign-on handshake.
//!
//! ```text
//! Unauthenticated -> ProbingSession -> FetchingLoginForm -> SubmittingCredentials
//!                 -> ValidatingTicket -> Authenticated
//!                                   \-> Failed (from any step)
//! ```
//!
//! The session is saved at exactly two checkpoints: after a probe finds the
//! stored session valid, and after a service ticket is validated. A failure
//! at any other point leaves the on-disk jar untouched.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::credentials::{CredentialProvider, Credentials};
use super::error::AuthError;
use crate::endpoints::PortalEndpoints;
use crate::http::{HttpClient, HttpConfig, RequestOptions, location_header};
use crate::session::SessionStore;

/// Label of the CAS submit button, sent verbatim with the form.
const SUBMIT_LABEL: &str = "登录";

/// Substrings of a submission redirect that mean the password was wrong.
const AUTH_FAILURE_MARKERS: &[&str] = &["authenticationFailure", "error="];

/// Query parameter carrying the CAS service ticket.
const TICKET_PARAM: &str = "ticket";

#[allow(clippy::expect_used)]
static EXECUTION_INPUT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"input[name="execution"]"#).expect("static selector is valid")
});

/// Where the handshake currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No valid session is known.
    Unauthenticated,
    /// Checking whether the stored session still works.
    ProbingSession,
    /// Obtaining credentials and the CAS `execution` token.
    FetchingLoginForm,
    /// Posting the login form.
    SubmittingCredentials,
    /// Redeeming the service ticket at the portal.
    ValidatingTicket,
    /// The session is valid and saved.
    Authenticated,
    /// The last attempt failed; terminal for that invocation.
    Failed,
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unauthenticated => "unauthenticated",
            Self::ProbingSession => "probing-session",
            Self::FetchingLoginForm => "fetching-login-form",
            Self::SubmittingCredentials => "submitting-credentials",
            Self::ValidatingTicket => "validating-ticket",
            Self::Authenticated => "authenticated",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Drives the CAS handshake and owns the session checkpoints.
///
/// The cookie jar is loaded from the [`SessionStore`] when the client is
/// built; [`http_client`](Self::http_client) hands the same jar to the
/// scraping and download services.
pub struct AuthClient {
    http: HttpClient,
    endpoints: PortalEndpoints,
    store: SessionStore,
    credentials: Arc<dyn CredentialProvider>,
    state: AuthState,
}

impl fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthClient")
            .field("endpoints", &self.endpoints)
            .field("store", &self.store)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl AuthClient {
    /// Opens the session file at `session_path` and builds the portal client
    /// around its jar.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Transport`] if the HTTP client cannot be built.
    pub fn new(
        endpoints: PortalEndpoints,
        session_path: impl Into<PathBuf>,
        credentials: Arc<dyn CredentialProvider>,
        http_config: HttpConfig,
    ) -> Result<Self, AuthError> {
        let (store, jar) = SessionStore::open(session_path);
        let http = HttpClient::new(Arc::new(jar), http_config)?;
        Ok(Self {
            http,
            endpoints,
            store,
            credentials,
            state: AuthState::Unauthenticated,
        })
    }

    /// Current handshake state.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.state
    }

    /// Portal endpoints this client authenticates against.
    #[must_use]
    pub fn endpoints(&self) -> &PortalEndpoints {
        &self.endpoints
    }

    /// A client sharing this session's cookie jar.
    #[must_use]
    pub fn http_client(&self) -> HttpClient {
        self.http.clone()
    }

    /// Account the credential provider is configured for, if known.
    #[must_use]
    pub fn current_user(&self) -> Option<String> {
        self.credentials.current_user()
    }

    /// Guarantees a valid portal session, logging in through CAS if needed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when any handshake step fails. Nothing is retried.
    #[instrument(skip(self))]
    pub async fn ensure_session(&mut self) -> Result<(), AuthError> {
        let result = self.run_handshake().await;
        if let Err(error) = &result {
            warn!(scope = "auth", %error, "authentication failed");
            self.transition(AuthState::Failed);
        }
        result
    }

    /// Drops the session in memory and on disk, and forgets cached credentials.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Session`] when the session file cannot be removed.
    pub fn logout(&mut self) -> Result<bool, AuthError> {
        self.http.jar().clear();
        self.credentials.clear();
        let removed = self.store.clear()?;
        self.transition(AuthState::Unauthenticated);
        Ok(removed)
    }

    async fn run_handshake(&mut self) -> Result<(), AuthError> {
        if self.probe_session().await? {
            self.store.save(self.http.jar())?;
            self.transition(AuthState::Authenticated);
            info!(scope = "auth", "stored session is valid");
            return Ok(());
        }
        self.transition(AuthState::Unauthenticated);

        self.transition(AuthState::FetchingLoginForm);
        let credentials = self
            .credentials
            .credentials()
            .await
            .ok_or(AuthError::CredentialsUnavailable)?;
        let login_url = self.endpoints.cas_login_with_service();
        let execution = self.fetch_execution(&login_url).await?;

        self.transition(AuthState::SubmittingCredentials);
        let ticket_url = self
            .submit_credentials(&login_url, &credentials, &execution)
            .await?;

        self.transition(AuthState::ValidatingTicket);
        self.validate_ticket(&ticket_url).await?;

        self.store.save(self.http.jar())?;
        self.credentials.remember(&credentials);
        self.transition(AuthState::Authenticated);
        info!(scope = "auth", user = %credentials.username, "CAS login succeeded");
        Ok(())
    }

    /// Returns whether the stored session is already accepted by the portal.
    async fn probe_session(&mut self) -> Result<bool, AuthError> {
        self.transition(AuthState::ProbingSession);

        let probe_url = self.endpoints.session_probe_url();
        let response = self
            .http
            .get(probe_url.as_str(), &RequestOptions::manual())
            .await?;
        let status = response.status().as_u16();
        debug!(scope = "auth", status, "session probe answered");

        if status == 200 {
            return Ok(true);
        }
        if status == 302
            && let Some(location) = location_header(&response)
            && let Ok(target) = probe_url.join(&location)
            && same_host(&target, self.endpoints.cas_login_url())
        {
            return Ok(false);
        }

        let api_url = self.endpoints.api_probe_url();
        let response = self
            .http
            .get(api_url.as_str(), &RequestOptions::manual())
            .await?;
        let status = response.status().as_u16();
        debug!(scope = "auth", status, "secondary API probe answered");
        Ok(status == 200)
    }

    async fn fetch_execution(&self, login_url: &Url) -> Result<String, AuthError> {
        let response = self
            .http
            .get(login_url.as_str(), &RequestOptions::follow())
            .await?;
        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| crate::http::TransportError::from_reqwest(&final_url, e))?;

        extract_execution(&body).ok_or(AuthError::MissingExecution { url: final_url })
    }

    async fn submit_credentials(
        &self,
        login_url: &Url,
        credentials: &Credentials,
        execution: &str,
    ) -> Result<Url, AuthError> {
        let form = [
            ("username", credentials.username.as_str()),
            ("password", credentials.password()),
            ("execution", execution),
            ("_eventId", "submit"),
            ("geolocation", ""),
            ("submit", SUBMIT_LABEL),
        ];
        let response = self
            .http
            .post_form(login_url.as_str(), &form, &RequestOptions::manual())
            .await?;

        let status = response.status().as_u16();
        if status != 302 {
            return Err(AuthError::UnexpectedStatus {
                stage: "credential submission",
                status,
            });
        }

        let location = location_header(&response).unwrap_or_default();
        if is_authentication_failure(&location) {
            self.credentials.clear();
            return Err(AuthError::InvalidCredentials);
        }

        match login_url.join(&location) {
            Ok(target) if carries_ticket(&target) => Ok(target),
            _ => Err(AuthError::MissingTicket { location }),
        }
    }

    async fn validate_ticket(&self, ticket_url: &Url) -> Result<(), AuthError> {
        let response = self
            .http
            .get(ticket_url.as_str(), &RequestOptions::follow())
            .await?;
        let status = response.status().as_u16();
        let final_url = response.url().clone();

        if status == 200 && same_host(&final_url, self.endpoints.base_url()) {
            return Ok(());
        }
        Err(AuthError::TicketRejected {
            status,
            final_url: final_url.to_string(),
        })
    }

    fn transition(&mut self, next: AuthState) {
        debug!(scope = "auth", from = %self.state, to = %next, "auth state");
        self.state = next;
    }
}

/// Extracts the hidden `execution` token from a CAS login page.
///
/// Returns `None` when the field is absent or empty.
#[must_use]
pub fn extract_execution(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&EXECUTION_INPUT)
        .filter_map(|input| input.value().attr("value"))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(ToString::to_string)
}

fn is_authentication_failure(location: &str) -> bool {
    AUTH_FAILURE_MARKERS
        .iter()
        .any(|marker| location.contains(marker))
}

fn carries_ticket(url: &Url) -> bool {
    url.query_pairs()
        .any(|(key, value)| key == TICKET_PARAM && !value.is_empty())
}

/// Host comparison used for redirect classification. The port participates so
/// that two services on one machine are still told apart.
fn same_host(a: &Url, b: &Url) -> bool {
    a.host_str().is_some()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<html><body>
<form id="fm1" method="post">
  <input type="text" name="username"/>
  <input type="password" name="password"/>
  <input type="hidden" name="execution" value="e1s1-abcdef"/>
  <input type="hidden" name="_eventId" value="submit"/>
</form>
</body></html>"#;

    #[test]
    fn test_extract_execution_reads_hidden_field() {
        assert_eq!(extract_execution(LOGIN_PAGE).as_deref(), Some("e1s1-abcdef"));
    }

    #[test]
    fn test_extract_execution_missing_field_returns_none() {
        let page = LOGIN_PAGE.replace(r#"name="execution""#, r#"name="lt""#);
        assert_eq!(extract_execution(&page), None);
        assert_eq!(extract_execution(""), None);
    }

    #[test]
    fn test_extract_execution_empty_value_returns_none() {
        let page = r#"<input type="hidden" name="execution" value="  "/>"#;
        assert_eq!(extract_execution(page), None);
    }

    #[test]
    fn test_authentication_failure_markers() {
        assert!(is_authentication_failure(
            "https://cas.example.edu/cas/login?service=x&authenticationFailure=true"
        ));
        assert!(is_authentication_failure("/cas/login?error=1"));
        assert!(!is_authentication_failure(
            "https://bb.example.edu/webapps/login/?ticket=ST-1"
        ));
    }

    #[test]
    fn test_carries_ticket_requires_non_empty_value() {
        let with = Url::parse("https://bb.example.edu/webapps/login/?ticket=ST-42-abc").unwrap();
        let empty = Url::parse("https://bb.example.edu/webapps/login/?ticket=").unwrap();
        let without = Url::parse("https://bb.example.edu/webapps/login/").unwrap();
        assert!(carries_ticket(&with));
        assert!(!carries_ticket(&empty));
        assert!(!carries_ticket(&without));
    }

    #[test]
    fn test_same_host_compares_host_and_port() {
        let a = Url::parse("https://cas.example.edu/cas/login").unwrap();
        let b = Url::parse("https://cas.example.edu:443/other").unwrap();
        let c = Url::parse("http://127.0.0.1:8080/").unwrap();
        let d = Url::parse("http://127.0.0.1:8081/").unwrap();
        assert!(same_host(&a, &b));
        assert!(!same_host(&c, &d));
    }

    #[test]
    fn test_auth_state_display() {
        assert_eq!(AuthState::ValidatingTicket.to_string(), "validating-ticket");
        assert_eq!(AuthState::Failed.to_string(), "failed");
    }
}
