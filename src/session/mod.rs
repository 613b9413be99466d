//! Cookie session: the in-memory jar and its on-disk snapshot.
//!
//! A [`SessionJar`] belongs to exactly one [`HttpClient`](crate::http::HttpClient);
//! [`SessionStore`] flushes it to disk only when a caller reaches a checkpoint.

mod error;
mod jar;
mod store;

pub use error::SessionError;
pub use jar::SessionJar;
pub use store::{SessionStore, default_config_dir, default_session_path};
