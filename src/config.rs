//! Application configuration loading for CLI defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use bb_vault::download::constants::{DEFAULT_CONCURRENCY, MAX_CONCURRENCY, MIN_CONCURRENCY};
use bb_vault::endpoints::{DEFAULT_BASE_URL, DEFAULT_CAS_LOGIN_URL};
use bb_vault::http::constants::{CONNECT_TIMEOUT_SECS, REQUEST_TIMEOUT_SECS};
use bb_vault::session::{default_config_dir, default_session_path};
use bb_vault::{HttpConfig, PortalEndpoints};
use serde::Deserialize;

const CONFIG_FILE_NAME: &str = "config.toml";
const DEFAULT_OUTPUT_DIR: &str = "./bb-vault";

/// TOML-backed file configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Portal root URL.
    pub base_url: Option<String>,
    /// CAS login endpoint.
    pub cas_login_url: Option<String>,
    /// Vault root for crawls.
    pub output_dir: Option<PathBuf>,
    /// Session snapshot location.
    pub session_path: Option<PathBuf>,
    /// Concurrent downloads (1..=32).
    pub concurrency: Option<usize>,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Whole-request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Terms crawled when none are given on the command line.
    pub terms: Option<Vec<String>>,
    /// Portal account name.
    pub username: Option<String>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
    /// Directory receiving raw response bodies for debugging.
    pub debug_dump_dir: Option<PathBuf>,
}

impl FileConfig {
    /// Validates config values against runtime constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(concurrency) = self.concurrency
            && !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency)
        {
            bail!(
                "Invalid config value for `concurrency`: {concurrency}. Expected range: {MIN_CONCURRENCY}..={MAX_CONCURRENCY}"
            );
        }
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("request_timeout_secs", self.request_timeout_secs)?;
        if let Some(terms) = &self.terms
            && terms.iter().any(|t| t.trim().is_empty())
        {
            bail!("Invalid config value for `terms`: entries must not be empty");
        }
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Tracing filter directive for this mode.
    #[must_use]
    pub fn filter(self) -> &'static str {
        match self {
            Self::Default => "info",
            Self::Verbose => "debug",
            Self::Quiet => "error",
            Self::Debug => "trace",
        }
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// Path the config was read from, if any.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

/// Resolves the default config path under the platform config directory.
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    default_config_dir()
        .ok()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Loads `explicit` (which must exist), or the default path if present.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = load_file_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config: Some(config),
        });
    }

    let Some(path) = resolve_default_config_path() else {
        return Ok(LoadedConfig::default());
    };
    if !path.exists() {
        return Ok(LoadedConfig::default());
    }
    let config = load_file_config(&path)?;
    Ok(LoadedConfig {
        path: Some(path),
        config: Some(config),
    })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let config: FileConfig = toml::from_str(raw)?;
    config.validate()?;
    Ok(config)
}

/// Effective settings: file values over built-in defaults.
///
/// Command-line flags are applied on top by the individual commands.
#[derive(Debug, Clone)]
pub struct Settings {
    pub endpoints: PortalEndpoints,
    pub session_path: PathBuf,
    pub http: HttpConfig,
    pub output_dir: PathBuf,
    pub concurrency: usize,
    pub terms: Vec<String>,
    pub username: Option<String>,
    pub debug_dump_dir: Option<PathBuf>,
}

impl Settings {
    /// Resolves settings from an optional file config.
    pub fn resolve(file: Option<&FileConfig>) -> Result<Self> {
        let file = file.cloned().unwrap_or_default();

        let base_url = file.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let cas_login_url = file.cas_login_url.as_deref().unwrap_or(DEFAULT_CAS_LOGIN_URL);
        let endpoints = PortalEndpoints::new(base_url, cas_login_url)?;

        let session_path = match file.session_path {
            Some(path) => path,
            None => default_session_path()
                .context("Cannot locate a directory for the session file")?,
        };

        let http = HttpConfig {
            connect_timeout: Duration::from_secs(
                file.connect_timeout_secs.unwrap_or(CONNECT_TIMEOUT_SECS),
            ),
            request_timeout: Duration::from_secs(
                file.request_timeout_secs.unwrap_or(REQUEST_TIMEOUT_SECS),
            ),
        };

        Ok(Self {
            endpoints,
            session_path,
            http,
            output_dir: file
                .output_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            concurrency: file.concurrency.unwrap_or(DEFAULT_CONCURRENCY),
            terms: file.terms.unwrap_or_default(),
            username: file.username,
            debug_dump_dir: file.debug_dump_dir,
        })
    }
}
