//! In-memory cookie jar shared by the portal HTTP clients.
//!
//! `reqwest`'s built-in jar cannot be enumerated, so it cannot be saved. This
//! jar wraps a [`cookie_store::CookieStore`] and implements reqwest's
//! [`CookieStore`](reqwest::cookie::CookieStore) trait so the same store can be
//! attached to a client and serialized by [`SessionStore`](super::SessionStore).

use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use cookie_store::{CookieStore, RawCookie};
use reqwest::header::HeaderValue;
use tracing::{debug, warn};
use url::Url;

/// Cookie jar owned by one [`HttpClient`](crate::http::HttpClient).
///
/// The lock exists because reqwest calls into the jar through `&self`; the
/// crawler never issues two session-mutating requests at once.
#[derive(Default)]
pub struct SessionJar {
    store: RwLock<CookieStore>,
}

impl SessionJar {
    /// Creates an empty jar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already-populated cookie store.
    #[must_use]
    pub fn from_store(store: CookieStore) -> Self {
        Self {
            store: RwLock::new(store),
        }
    }

    /// Adds a cookie from a `Set-Cookie` style string as if `url` had sent it.
    pub fn add_cookie_str(&self, cookie: &str, url: &Url) {
        match RawCookie::parse(cookie.to_owned()) {
            Ok(raw) => self.write().store_response_cookies(std::iter::once(raw), url),
            Err(error) => warn!(scope = "session", %error, "ignoring unparseable cookie"),
        }
    }

    /// Returns the `(name, value)` pairs that would be sent to `url`.
    #[must_use]
    pub fn request_values(&self, url: &Url) -> Vec<(String, String)> {
        self.read()
            .get_request_values(url)
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    /// Number of cookies held, including expired ones not yet evicted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().iter_any().count()
    }

    /// Returns true when the jar holds no cookies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cookie.
    pub fn clear(&self) {
        self.write().clear();
        debug!(scope = "session", "cookie jar cleared");
    }

    /// Runs `f` with shared access to the underlying store.
    pub(crate) fn with_store<T>(&self, f: impl FnOnce(&CookieStore) -> T) -> T {
        f(&self.read())
    }

    fn read(&self) -> RwLockReadGuard<'_, CookieStore> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CookieStore> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }
}

// Cookie values are credentials; only the count is shown.
impl fmt::Debug for SessionJar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionJar")
            .field("cookies", &self.len())
            .finish()
    }
}

impl reqwest::cookie::CookieStore for SessionJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let cookies = cookie_headers.filter_map(|value| {
            value
                .to_str()
                .ok()
                .and_then(|raw| RawCookie::parse(raw.to_owned()).ok())
        });
        self.write().store_response_cookies(cookies, url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let header = self
            .read()
            .get_request_values(url)
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");

        if header.is_empty() {
            return None;
        }
        HeaderValue::from_str(&header).ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::cookie::CookieStore as _;

    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_add_cookie_str_matches_same_host_only() {
        let jar = SessionJar::new();
        jar.add_cookie_str("JSESSIONID=abc; Path=/", &url("https://bb.example.edu/webapps/"));

        assert_eq!(
            jar.request_values(&url("https://bb.example.edu/webapps/portal")),
            vec![("JSESSIONID".to_string(), "abc".to_string())]
        );
        assert!(
            jar.request_values(&url("https://cas.example.edu/"))
                .is_empty()
        );
    }

    #[test]
    fn test_reqwest_trait_round_trip_builds_cookie_header() {
        let jar = SessionJar::new();
        let origin = url("https://bb.example.edu/");
        let headers = [
            HeaderValue::from_static("a=1; Path=/"),
            HeaderValue::from_static("b=2; Path=/"),
        ];
        jar.set_cookies(&mut headers.iter(), &origin);

        let header = jar.cookies(&origin).unwrap();
        let header = header.to_str().unwrap();
        assert!(header.contains("a=1"));
        assert!(header.contains("b=2"));
        assert_eq!(jar.len(), 2);
    }

    #[test]
    fn test_cookies_returns_none_for_empty_jar() {
        let jar = SessionJar::new();
        assert!(jar.cookies(&url("https://bb.example.edu/")).is_none());
        assert!(jar.is_empty());
    }

    #[test]
    fn test_clear_drops_everything() {
        let jar = SessionJar::new();
        jar.add_cookie_str("s=1", &url("https://bb.example.edu/"));
        assert!(!jar.is_empty());
        jar.clear();
        assert!(jar.is_empty());
    }

    #[test]
    fn test_debug_does_not_leak_values() {
        let jar = SessionJar::new();
        jar.add_cookie_str("token=supersecret", &url("https://bb.example.edu/"));
        let debug = format!("{jar:?}");
        assert!(!debug.contains("supersecret"));
        assert!(debug.contains("cookies: 1"));
    }
}
