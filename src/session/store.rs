//! Durable cookie jar persistence.
//!
//! The jar is written as `cookie_store` JSON to
//! `~/.config/bb-vault/session.json` (or `$XDG_CONFIG_HOME/bb-vault/session.json`)
//! at explicit checkpoints only. Loading is fail-soft: a missing or corrupt
//! file yields an empty jar.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use super::{SessionError, SessionJar};

const SESSION_FILE_NAME: &str = "session.json";
const APP_DIR_NAME: &str = "bb-vault";

/// Reads and writes the session file for one cookie jar.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Creates a store bound to `path`. Nothing is read until [`load`](Self::load).
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Binds a store to `path` and loads its jar in one step.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> (Self, SessionJar) {
        let store = Self::new(path);
        let jar = store.load();
        (store, jar)
    }

    /// Path of the session file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted jar, falling back to an empty jar on any failure.
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> SessionJar {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(error) => {
                debug!(scope = "session", %error, "no session file; starting with empty jar");
                return SessionJar::new();
            }
        };

        match cookie_store::serde::json::load_all(BufReader::new(file)) {
            Ok(store) => {
                let jar = SessionJar::from_store(store);
                info!(scope = "session", cookies = jar.len(), "loaded persisted session");
                jar
            }
            Err(error) => {
                warn!(
                    scope = "session",
                    error = %error,
                    "session file unreadable; starting with empty jar"
                );
                SessionJar::new()
            }
        }
    }

    /// Writes an atomic JSON snapshot of `jar`, creating parent directories.
    ///
    /// The snapshot goes to a sibling temp file first and is then renamed over
    /// the target, so an interrupted save never leaves a truncated session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when serialization or any filesystem step fails.
    #[instrument(level = "debug", skip(self, jar), fields(path = %self.path.display()))]
    pub fn save(&self, jar: &SessionJar) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| SessionError::io(parent, e))?;
        }

        let mut payload = Vec::new();
        jar.with_store(|store| {
            cookie_store::serde::json::save_incl_expired_and_nonpersistent(store, &mut payload)
        })
        .map_err(|e| SessionError::Serialize(e.to_string()))?;

        let tmp_path = temp_path_for(&self.path);
        fs::write(&tmp_path, &payload).map_err(|e| SessionError::io(&tmp_path, e))?;
        set_owner_only_permissions(&tmp_path)?;
        fs::rename(&tmp_path, &self.path).map_err(|e| SessionError::io(&self.path, e))?;

        info!(scope = "session", cookies = jar.len(), "session saved");
        Ok(())
    }

    /// Removes the session file. Returns whether a file existed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] when removal fails.
    pub fn clear(&self) -> Result<bool, SessionError> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path).map_err(|e| SessionError::io(&self.path, e))?;
        Ok(true)
    }
}

/// Returns the default session file path (`~/.config/bb-vault/session.json`).
///
/// # Errors
///
/// Returns [`SessionError::ConfigDirUnavailable`] if no usable config dir is found.
pub fn default_session_path() -> Result<PathBuf, SessionError> {
    Ok(default_config_dir()?.join(SESSION_FILE_NAME))
}

/// Returns the per-user config directory for this tool.
///
/// # Errors
///
/// Returns [`SessionError::ConfigDirUnavailable`] if none of
/// `XDG_CONFIG_HOME`, `HOME` or `APPDATA` is set.
pub fn default_config_dir() -> Result<PathBuf, SessionError> {
    resolve_config_dir(
        sanitize_env_path(env::var_os("XDG_CONFIG_HOME")),
        sanitize_env_path(env::var_os("HOME")),
        sanitize_env_path(env::var_os("APPDATA")),
    )
}

fn sanitize_env_path(value: Option<OsString>) -> Option<PathBuf> {
    let value = value?;
    if value.to_string_lossy().trim().is_empty() {
        return None;
    }

    Some(PathBuf::from(value))
}

fn resolve_config_dir(
    xdg_config_home: Option<PathBuf>,
    home: Option<PathBuf>,
    app_data: Option<PathBuf>,
) -> Result<PathBuf, SessionError> {
    if let Some(xdg) = xdg_config_home {
        return Ok(xdg.join(APP_DIR_NAME));
    }
    if let Some(home) = home {
        return Ok(home.join(".config").join(APP_DIR_NAME));
    }
    if let Some(app_data) = app_data {
        return Ok(app_data.join(APP_DIR_NAME));
    }

    Err(SessionError::ConfigDirUnavailable)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from(SESSION_FILE_NAME));
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(unix)]
fn set_owner_only_permissions(path: &Path) -> Result<(), SessionError> {
    use std::os::unix::fs::PermissionsExt;

    let permissions = fs::Permissions::from_mode(0o600);
    fs::set_permissions(path, permissions).map_err(|e| SessionError::io(path, e))
}

#[cfg(not(unix))]
fn set_owner_only_permissions(_path: &Path) -> Result<(), SessionError> {
    Ok(())
}
