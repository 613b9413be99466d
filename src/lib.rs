//! bb-vault core library
//!
//! Mirrors a Blackboard course portal behind CAS single sign-on into a local
//! directory tree of section descriptions and attachments.
//!
//! # Architecture
//!
//! - [`session`] - cookie jar and its on-disk snapshot
//! - [`http`] - cookie-aware client with explicit redirect handling
//! - [`auth`] - CAS handshake and credential providers
//! - [`parser`] - course list, sidebar and content page parsers
//! - [`course`] - scraping façade over the portal client
//! - [`download`] - bounded-concurrency file fetcher
//! - [`crawl`] - the full term/course/page walk
//! - [`endpoints`] - portal and CAS URLs

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod course;
pub mod crawl;
pub mod download;
pub mod endpoints;
pub mod http;
pub mod parser;
pub mod session;
pub mod user_agent;

// Re-export commonly used types
pub use auth::{AuthClient, AuthError, AuthState, CredentialProvider, Credentials};
pub use course::CourseService;
pub use crawl::{
    CrawlError, CrawlOptions, CrawlOrchestrator, CrawlSummary, DownloadGranularity,
    NoopProgress, ProgressEvent, ProgressReporter,
};
pub use download::{
    DEFAULT_CONCURRENCY, DownloadError, DownloadService, DownloadStats, DownloadTask,
};
pub use endpoints::PortalEndpoints;
pub use http::{HttpClient, HttpConfig, RequestOptions, TransportError};
pub use parser::{CoursesByTerm, PageSection, Sidebar};
pub use session::{SessionError, SessionJar, SessionStore};
