//! Error types for the Octyne client.
//!
//! Every operation on [`Client`](crate::Client) fails with the same [`Error`]
//! enum, whatever shape the control plane used to reject it. Callers branch on
//! [`Error::kind`] to decide how to recover (for instance logging in again on
//! [`ErrorKind::NotAuthenticated`] or [`ErrorKind::Authentication`]).

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed source error from the HTTP or WebSocket transport.
pub type TransportSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Message used when the control plane rejects a call without an `error` field.
pub(crate) const UNEXPECTED_RESPONSE: &str = "unexpected response from control plane";

/// Errors that can occur while talking to the control plane.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid client configuration. Raised locally, no request is made.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No session token is held. Raised locally, no request is made.
    #[error("you need to be logged in to do this")]
    NotAuthenticated,

    /// Login or logout rejected, or the session token refused (HTTP 401).
    #[error("authentication failed: {}", with_status(message, *status))]
    Authentication { message: String, status: Option<u16> },

    /// Ticket issuance rejected by the control plane.
    #[error("ticket request failed: {}", with_status(message, *status))]
    Ticket { message: String, status: Option<u16> },

    /// Any other operation rejected by the control plane.
    #[error("{}", with_status(message, *status))]
    Request { message: String, status: Option<u16> },

    /// Network or socket failure, passed through from the transport.
    #[error("transport error: {0}")]
    Transport(#[source] TransportSource),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    NotAuthenticated,
    Authentication,
    Ticket,
    Request,
    Transport,
}

fn with_status(message: &str, status: Option<u16>) -> String {
    match status {
        Some(code) => format!("{} (HTTP {})", message, code),
        None => message.to_string(),
    }
}

impl Error {
    /// Build a [`Error::Request`] from a server message and HTTP status.
    pub(crate) fn request(message: impl Into<String>, status: u16) -> Self {
        Self::Request {
            message: message.into(),
            status: Some(status),
        }
    }

    /// Wrap any transport-level failure.
    pub fn transport(err: impl Into<TransportSource>) -> Self {
        Self::Transport(err.into())
    }

    /// Which part of the taxonomy this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::NotAuthenticated => ErrorKind::NotAuthenticated,
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::Ticket { .. } => ErrorKind::Ticket,
            Self::Request { .. } => ErrorKind::Request,
            Self::Transport(_) => ErrorKind::Transport,
        }
    }

    /// The message sent by the control plane, verbatim.
    ///
    /// `None` for errors raised locally or by the transport.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Authentication { message, .. }
            | Self::Ticket { message, .. }
            | Self::Request { message, .. } => Some(message),
            _ => None,
        }
    }

    /// HTTP status of the rejected response, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. }
            | Self::Ticket { status, .. }
            | Self::Request { status, .. } => *status,
            _ => None,
        }
    }

    /// True when logging in again is the sensible recovery.
    pub fn requires_login(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::NotAuthenticated | ErrorKind::Authentication
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(Box::new(err))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(Box::new(err))
    }
}
