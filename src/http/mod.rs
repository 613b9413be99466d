//! Cookie-aware HTTP transport shared by authentication, scraping and downloads.
//!
//! # Features
//!
//! - Manual redirect handling by default, opt-in following per request
//! - One shared [`SessionJar`](crate::session::SessionJar) across redirect modes
//! - Fixed desktop User-Agent unless overridden
//! - Configurable timeouts (30s connect, 5min total by default)
//!
//! The client never persists cookies on its own. Saving the jar is an explicit
//! checkpoint taken by [`AuthClient`](crate::auth::AuthClient).

mod client;
pub mod constants;
mod error;

pub use client::{HttpClient, HttpConfig, RedirectMode, RequestOptions, location_header};
pub use error::TransportError;
