//! CAS authentication and credential handling.
//!
//! [`AuthClient`] drives the single-sign-on handshake and decides when the
//! session is durable enough to save. Credentials come from a
//! [`CredentialProvider`] supplied by the caller.

mod client;
mod credentials;
mod error;

pub use client::{AuthClient, AuthState, extract_execution};
pub use credentials::{
    CredentialProvider, Credentials, KeyringCredentialProvider, PASSWORD_ENV, StaticCredentials,
    USERNAME_ENV,
};
pub use error::AuthError;
