//! `logout`: forget the session and cached credentials.

use anyhow::{Context, Result};
use tracing::info;

use super::build_auth_client;
use crate::config::Settings;

pub fn run_logout_command(settings: &Settings, username: Option<String>) -> Result<()> {
    let mut auth = build_auth_client(settings, username)?;
    let removed = auth.logout().context("Failed to clear the stored session")?;

    if removed {
        info!(path = %settings.session_path.display(), "Cleared stored session");
    } else {
        info!("No stored session found");
    }
    Ok(())
}
