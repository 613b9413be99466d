//! Shared User-Agent string for portal and CAS traffic.
//!
//! The portal serves different markup to unknown clients, so every request
//! identifies as the same desktop browser unless a caller overrides it.

/// Desktop browser User-Agent sent with every request by default.
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
