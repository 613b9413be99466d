//! Constants for the portal HTTP client (timeouts, redirect limits).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default whole-request timeout (5 minutes, large attachments included).
pub const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Redirect hops followed by [`RedirectMode::Follow`](super::RedirectMode::Follow) requests.
pub const MAX_FOLLOWED_REDIRECTS: usize = 10;
