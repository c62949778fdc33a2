//! Client library for the Octyne process manager.
//!
//! This crate provides:
//! - A session [`Client`] that logs in, holds one session token and attaches
//!   it to every request
//! - One-time tickets for connections that cannot send headers
//! - Server control (list, status, start, stop) and live consoles
//! - File operations on each server's working directory
//!
//! Every failure, whether local, from the network or from the control plane,
//! is reported as one [`Error`] type classified by [`ErrorKind`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │            servers  ·  files  ·  console            │
//! └─────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────┐
//! │                       Client                        │
//! │   credentials · session token · request · errors    │
//! └─────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────┐
//! │  HttpTransport (reqwest) · WebSocket (tungstenite)  │
//! └─────────────────────────────────────────────────────┘
//! ```

mod client;
mod error;
mod response;

pub mod auth;
pub mod console;
pub mod files;
pub mod servers;
pub mod transport;

#[cfg(test)]
mod testing;

pub use auth::{Credentials, SessionToken, Ticket};
pub use client::{Client, ClientInfo, RequestOptions};
pub use console::{ConsoleAuth, ConsoleStream};
pub use error::{Error, ErrorKind, Result, TransportSource};
pub use files::FileEntry;
pub use servers::{ServerInfo, ServerStatus};
pub use tokio_tungstenite::tungstenite::Message as ConsoleMessage;
pub use transport::{ByteStream, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
