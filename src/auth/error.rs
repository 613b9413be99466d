//! Error types for the CAS handshake.

use thiserror::Error;

use crate::http::TransportError;
use crate::session::SessionError;

/// Terminal failures of [`AuthClient::ensure_session`](super::AuthClient::ensure_session).
///
/// None of these are retried; the caller reports them once.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The credential provider had nothing to offer (user declined the prompt).
    #[error("no credentials supplied; login aborted")]
    CredentialsUnavailable,

    /// The CAS login page did not carry a hidden `execution` field.
    #[error("CAS login page at {url} has no execution token")]
    MissingExecution {
        /// Login page URL.
        url: String,
    },

    /// CAS redirected back with an authentication-failure marker.
    #[error("CAS rejected the username or password")]
    InvalidCredentials,

    /// A handshake step answered with a status the protocol does not allow.
    #[error("unexpected HTTP {status} during {stage}")]
    UnexpectedStatus {
        /// Handshake step that failed.
        stage: &'static str,
        /// The HTTP status code.
        status: u16,
    },

    /// The credential submission redirect carried no service ticket.
    #[error("CAS redirect carried no service ticket (location: {location})")]
    MissingTicket {
        /// The `Location` header, empty when absent.
        location: String,
    },

    /// Ticket validation did not land on the portal with HTTP 200.
    #[error("service ticket rejected: HTTP {status} at {final_url}")]
    TicketRejected {
        /// Final status after following redirects.
        status: u16,
        /// Final resolved URL.
        final_url: String,
    },

    /// A request failed at the transport level.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The session checkpoint could not be written.
    #[error(transparent)]
    Session(#[from] SessionError),
}
