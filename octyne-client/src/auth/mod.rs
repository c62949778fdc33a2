//! Credential material held by a [`Client`](crate::Client).
//!
//! Passwords, session tokens and tickets are wrapped in [`SecretString`] so
//! they never leak through `Debug`, logging or serialization. The only way to
//! read one is an explicit `.expose_secret()`, which the client does when it
//! builds a request.
//!
//! # Example
//!
//! ```ignore
//! use octyne_client::{Client, Credentials};
//!
//! let client = Client::new("http://localhost:42069", Credentials::password("admin", "hunter2"))?;
//! let client = Client::new("http://localhost:42069", Credentials::token("5f0e..."))?;
//! ```

use secrecy::{ExposeSecret, SecretString};

use crate::{Error, Result};

/// How a client authenticates.
///
/// Either a username/password pair used by [`login`](crate::Client::login), or a
/// session token obtained elsewhere.
#[derive(Clone)]
pub enum Credentials {
    Password {
        username: String,
        password: SecretString,
    },
    Token(SessionToken),
}

impl Credentials {
    /// Username/password credentials.
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Password {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// A pre-existing session token.
    pub fn token(token: impl Into<String>) -> Self {
        Self::Token(SessionToken::new(token))
    }

    /// Build credentials from optional parts, as read from config or flags.
    ///
    /// A complete, non-empty username/password pair takes precedence over a
    /// token. Empty strings count as missing.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if neither a complete pair nor a token
    /// is given.
    pub fn from_parts(
        username: Option<String>,
        password: Option<String>,
        token: Option<String>,
    ) -> Result<Self> {
        let present = |value: Option<String>| value.filter(|v| !v.is_empty());
        match (present(username), present(password), present(token)) {
            (Some(username), Some(password), _) => Ok(Self::password(username, password)),
            (_, _, Some(token)) => Ok(Self::token(token)),
            _ => Err(Error::Configuration(
                "either a username and password or a token must be provided".to_string(),
            )),
        }
    }

    /// Check the credentials are usable.
    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Self::Password { username, password } => {
                if username.is_empty() || password.expose_secret().is_empty() {
                    return Err(Error::Configuration(
                        "username and password must both be non-empty".to_string(),
                    ));
                }
            }
            Self::Token(token) => {
                if token.expose_secret().is_empty() {
                    return Err(Error::Configuration("token must be non-empty".to_string()));
                }
            }
        }
        Ok(())
    }

    /// The username, if these are password credentials.
    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Password { username, .. } => Some(username),
            Self::Token(_) => None,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
            Self::Token(_) => f.debug_tuple("Token").field(&"[REDACTED]").finish(),
        }
    }
}

/// An opaque session token, sent as the `Authorization` header.
#[derive(Clone)]
pub struct SessionToken(SecretString);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// Expose the token value.
    ///
    /// Use sparingly - only when actually sending it to the control plane.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionToken([REDACTED])")
    }
}

/// A one-time ticket for connections that cannot send an `Authorization` header.
///
/// Tickets expire server-side after roughly two minutes, are bound to the
/// caller's IP and may be used once. The client never caches them.
#[derive(Clone)]
pub struct Ticket(SecretString);

impl Ticket {
    pub fn new(ticket: impl Into<String>) -> Self {
        Self(SecretString::from(ticket.into()))
    }

    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for Ticket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ticket([REDACTED])")
    }
}
