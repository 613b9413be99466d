//! `login`: establish and persist a portal session.

use anyhow::{Context, Result};
use tracing::info;

use super::build_auth_client;
use crate::config::Settings;

pub async fn run_login_command(settings: &Settings, username: Option<String>) -> Result<()> {
    let mut auth = build_auth_client(settings, username)?;
    auth.ensure_session().await.context("Login failed")?;

    let user = auth.current_user().unwrap_or_else(|| "stored session".to_string());
    info!(
        user = %user,
        session = %settings.session_path.display(),
        "Logged in"
    );
    Ok(())
}
