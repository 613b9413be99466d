//! CLI command handlers.

mod courses;
mod crawl;
mod login;
mod logout;

use std::sync::Arc;

use anyhow::{Context, Result};
use bb_vault::auth::KeyringCredentialProvider;
use bb_vault::AuthClient;

use crate::config::Settings;

pub use courses::{CoursesArgs, run_courses_command};
pub use crawl::{CrawlArgs, run_crawl_command};
pub use login::run_login_command;
pub use logout::run_logout_command;

/// Builds the authentication client shared by every command.
///
/// `username` from the command line wins over the config file.
fn build_auth_client(settings: &Settings, username: Option<String>) -> Result<AuthClient> {
    let username = username.or_else(|| settings.username.clone());
    let credentials = Arc::new(KeyringCredentialProvider::new(username));
    AuthClient::new(
        settings.endpoints.clone(),
        settings.session_path.clone(),
        credentials,
        settings.http,
    )
        .context("Failed to build the portal client")
}
