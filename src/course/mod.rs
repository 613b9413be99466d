//! Course catalog, navigation and content retrieval.
//!
//! [`CourseService`] composes the portal client with the markup parsers. It
//! issues one request per call, never retries, and expects the session to be
//! established already.

mod service;

pub use service::{COURSES_DUMP, CourseService, PAGE_DUMP, SIDEBAR_DUMP};
