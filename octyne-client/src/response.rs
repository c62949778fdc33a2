//! Parsed control-plane replies.
//!
//! The control plane reports failure in the body (`{"error": "..."}`), often
//! alongside a 2xx status. [`ApiReply`] keeps the status and parsed body
//! together so every call site interprets rejections the same way.

use serde_json::Value;

use crate::error::UNEXPECTED_RESPONSE;
use crate::transport::HttpResponse;
use crate::{Error, Result};

/// A JSON reply and the HTTP status it came with.
#[derive(Debug, Clone)]
pub struct ApiReply {
    pub status: u16,
    pub body: Value,
}

impl ApiReply {
    /// Read and parse a response body as JSON.
    ///
    /// # Errors
    ///
    /// Returns `Error::Request` carrying the status if the body is not JSON,
    /// or `Error::Transport` if reading the body fails.
    pub async fn read(response: HttpResponse) -> Result<Self> {
        let status = response.status.as_u16();
        let bytes = response.bytes().await?;
        let body = serde_json::from_slice(&bytes)
            .map_err(|e| Error::request(format!("malformed response body: {}", e), status))?;
        Ok(Self { status, body })
    }

    /// The server-supplied `error` message, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }

    /// A string field of the body.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.body.get(key).and_then(Value::as_str)
    }

    /// Whether the body carries `key` at all (even if it is `0`, `false` or `null`).
    pub fn has_field(&self, key: &str) -> bool {
        self.body.get(key).is_some()
    }

    /// The rejection message to report: the server's `error`, or a generic one.
    pub fn rejection_message(&self) -> String {
        self.error_message().unwrap_or(UNEXPECTED_RESPONSE).to_string()
    }

    /// The error for a rejected reply.
    ///
    /// A 401 means the session token is missing server-side (expired, or
    /// logged out concurrently) and is reported as `Error::Authentication`;
    /// anything else is `Error::Request`.
    pub fn rejection(&self) -> Error {
        let message = self.rejection_message();
        if self.status == 401 {
            Error::Authentication {
                message,
                status: Some(self.status),
            }
        } else {
            Error::request(message, self.status)
        }
    }

    /// `Ok` unless the body has an `error` field.
    pub fn ok_unless_error(self) -> Result<Self> {
        if self.error_message().is_some() {
            Err(self.rejection())
        } else {
            Ok(self)
        }
    }

    /// `Ok` if the body has `key`, otherwise the server's rejection.
    pub fn require_field(self, key: &str) -> Result<Self> {
        if self.has_field(key) && self.error_message().is_none() {
            Ok(self)
        } else {
            Err(self.rejection())
        }
    }
}
