//! Credential providers consumed by the CAS handshake.
//!
//! The core asks for credentials only when the stored session is invalid and
//! never writes them anywhere itself. Providers may cache them: the CLI
//! provider keeps the password in the system keychain after a successful login.

use std::env;
use std::fmt;
use std::io::{self, IsTerminal, Write};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tracing::{debug, warn};

const KEYRING_SERVICE: &str = "bb-vault";

/// Environment variable consulted for the portal username.
pub const USERNAME_ENV: &str = "BB_USERNAME";

/// Environment variable consulted for the portal password.
pub const PASSWORD_ENV: &str = "BB_PASSWORD";

/// Username and password for the CAS login form.
///
/// The password is redacted in Debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account name (student/staff id).
    pub username: String,
    password: String,
}

impl Credentials {
    /// Creates a credential pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns the password. Never log the return value.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Supplies login secrets to [`AuthClient`](super::AuthClient).
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Returns credentials, or `None` when the user declines to supply them.
    async fn credentials(&self) -> Option<Credentials>;

    /// Called after CAS accepted `credentials`; providers may cache them.
    fn remember(&self, _credentials: &Credentials) {}

    /// Forgets any cached secret.
    fn clear(&self);

    /// Describes the account currently configured, if known.
    fn current_user(&self) -> Option<String>;
}

/// Fixed credentials, for tests and non-interactive callers.
#[derive(Debug, Default)]
pub struct StaticCredentials {
    inner: Mutex<Option<Credentials>>,
}

impl StaticCredentials {
    /// Provider that always returns `credentials` until cleared.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self {
            inner: Mutex::new(Some(credentials)),
        }
    }

    /// Provider that always declines.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn credentials(&self) -> Option<Credentials> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn clear(&self) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn current_user(&self) -> Option<String> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|c| c.username.clone())
    }
}

/// Interactive provider backed by the environment, the system keychain and stdin.
///
/// Lookup order for the password: `BB_PASSWORD`, keychain entry for the
/// username, then a prompt on stdin when attached to a terminal. An empty
/// answer to either prompt counts as declining.
#[derive(Debug)]
pub struct KeyringCredentialProvider {
    username: Mutex<Option<String>>,
    interactive: bool,
}

impl KeyringCredentialProvider {
    /// Creates a provider. `username` falls back to `BB_USERNAME`.
    #[must_use]
    pub fn new(username: Option<String>) -> Self {
        let username = username
            .or_else(|| env::var(USERNAME_ENV).ok())
            .filter(|u| !u.trim().is_empty());
        Self {
            username: Mutex::new(username),
            interactive: io::stdin().is_terminal(),
        }
    }

    fn username(&self) -> Option<String> {
        self.username
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn resolve_username(&self) -> Option<String> {
        if let Some(username) = self.username() {
            return Some(username);
        }
        if !self.interactive {
            return None;
        }
        let answer = prompt("Username: ", read_visible).await?;
        *self.username.lock().unwrap_or_else(PoisonError::into_inner) = Some(answer.clone());
        Some(answer)
    }
}

#[async_trait]
impl CredentialProvider for KeyringCredentialProvider {
    async fn credentials(&self) -> Option<Credentials> {
        let username = self.resolve_username().await?;

        if let Ok(password) = env::var(PASSWORD_ENV)
            && !password.is_empty()
        {
            debug!(scope = "auth", "using password from environment");
            return Some(Credentials::new(username, password));
        }

        if let Some(password) = keyring_get(&username) {
            debug!(scope = "auth", "using password from keychain");
            return Some(Credentials::new(username, password));
        }

        if !self.interactive {
            return None;
        }
        let password = prompt("Password: ", read_hidden).await?;
        Some(Credentials::new(username, password))
    }

    fn remember(&self, credentials: &Credentials) {
        if env::var_os(PASSWORD_ENV).is_some() {
            return;
        }
        if !keyring_set(&credentials.username, credentials.password()) {
            warn!(scope = "auth", "could not cache password in system keychain");
        }
    }

    fn clear(&self) {
        if let Some(username) = self.username() {
            keyring_delete(&username);
        }
    }

    fn current_user(&self) -> Option<String> {
        self.username()
    }
}

/// Reads one answer on a blocking thread. Blank answers count as none.
async fn prompt(
    prompt: &'static str,
    read: fn(&'static str) -> io::Result<String>,
) -> Option<String> {
    let answer = tokio::task::spawn_blocking(move || read(prompt).ok())
        .await
        .ok()
        .flatten()?;

    let answer = answer.trim().to_string();
    (!answer.is_empty()).then_some(answer)
}

fn read_visible(prompt: &str) -> io::Result<String> {
    let mut stderr = io::stderr();
    write!(stderr, "{prompt}")?;
    stderr.flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line)
}

/// Reads from the terminal with echo turned off.
fn read_hidden(prompt: &str) -> io::Result<String> {
    rpassword::prompt_password(prompt)
}

fn keyring_entry(username: &str) -> Option<keyring::Entry> {
    catch_unwind(|| keyring::Entry::new(KEYRING_SERVICE, username))
        .ok()?
        .ok()
}

fn keyring_get(username: &str) -> Option<String> {
    let entry = keyring_entry(username)?;
    catch_unwind(AssertUnwindSafe(|| entry.get_password()))
        .ok()?
        .ok()
        .filter(|p| !p.is_empty())
}

fn keyring_set(username: &str, password: &str) -> bool {
    let Some(entry) = keyring_entry(username) else {
        return false;
    };
    catch_unwind(AssertUnwindSafe(|| entry.set_password(password)))
        .is_ok_and(|result| result.is_ok())
}

fn keyring_delete(username: &str) {
    if let Some(entry) = keyring_entry(username) {
        let _ = catch_unwind(AssertUnwindSafe(|| entry.delete_credential()));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("12010101", "hunter2");
        let debug = format!("{creds:?}");
        assert!(debug.contains("12010101"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn test_static_credentials_until_cleared() {
        let provider = StaticCredentials::new(Credentials::new("alice", "pw"));
        assert_eq!(provider.current_user().as_deref(), Some("alice"));
        assert_eq!(
            provider.credentials().await,
            Some(Credentials::new("alice", "pw"))
        );

        provider.clear();
        assert!(provider.credentials().await.is_none());
        assert!(provider.current_user().is_none());
    }

    #[tokio::test]
    async fn test_static_none_declines() {
        assert!(StaticCredentials::none().credentials().await.is_none());
    }

    #[tokio::test]
    async fn test_prompt_trims_answer_and_declines_blank() {
        let answer = prompt("Password: ", |_| Ok("  hunter2 \n".to_string())).await;
        assert_eq!(answer.as_deref(), Some("hunter2"));

        assert!(prompt("Password: ", |_| Ok("\n".to_string())).await.is_none());
        assert!(
            prompt("Password: ", |_| Err(io::Error::other("no tty")))
                .await
                .is_none()
        );
    }

    #[test]
    fn test_keyring_provider_keeps_explicit_username() {
        let provider = KeyringCredentialProvider::new(Some("bob".to_string()));
        assert_eq!(provider.current_user().as_deref(), Some("bob"));
    }
}
