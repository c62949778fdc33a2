//! Live server consoles over WebSocket.
//!
//! A console connection authenticates either with the usual `Authorization`
//! header or, for environments that cannot set headers on a WebSocket
//! handshake (browsers, some proxies), with a one-time ticket in the query
//! string. Which one to use is the caller's call via [`ConsoleAuth`].

use http::header::AUTHORIZATION;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};
use url::Url;

use crate::auth::Ticket;
use crate::client::{Client, authorization};
use crate::{Error, Result};

/// An open console connection. Reading, writing and closing it is up to the caller.
pub type ConsoleStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How a console connection authenticates.
#[derive(Debug, Clone, Default)]
pub enum ConsoleAuth {
    /// Send the session token as an `Authorization` header.
    #[default]
    Header,
    /// Mint a fresh ticket and pass it as `?ticket=`.
    MintTicket,
    /// Use this ticket as `?ticket=`.
    Ticket(Ticket),
}

impl ConsoleAuth {
    /// Pick a strategy from whether the connecting context can set headers.
    pub fn for_context(headers_supported: bool) -> Self {
        if headers_supported {
            Self::Header
        } else {
            Self::MintTicket
        }
    }
}

impl Client {
    /// `ws(s)://<endpoint>/server/<name>/console[?ticket=...]`
    pub fn console_url(&self, server: &str, ticket: Option<&Ticket>) -> Result<Url> {
        let mut url = self.url(&["server", server, "console"])?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| Error::Configuration(format!("cannot use {} for a console URL", scheme)))?;

        if let Some(ticket) = ticket {
            url.set_query(Some(&format!(
                "ticket={}",
                urlencoding::encode(ticket.expose_secret())
            )));
        }
        Ok(url)
    }

    /// Build the WebSocket handshake request for a console.
    ///
    /// With a ticket, the request carries no `Authorization` header; without
    /// one, a session token is required.
    pub fn console_request(
        &self,
        server: &str,
        ticket: Option<&Ticket>,
    ) -> Result<http::Request<()>> {
        let url = self.console_url(server, ticket)?;
        let mut request = url.as_str().into_client_request()?;
        if ticket.is_none() {
            let token = self.session_token()?;
            request
                .headers_mut()
                .insert(AUTHORIZATION, authorization(&token)?);
        }
        Ok(request)
    }

    /// Connect to a server's console.
    ///
    /// Resolves once the handshake completes. A failure before that point
    /// (refused connection, rejected handshake) is returned as
    /// `Error::Transport`.
    pub async fn open_console(&self, server: &str, auth: ConsoleAuth) -> Result<ConsoleStream> {
        let ticket = match auth {
            ConsoleAuth::Header => None,
            ConsoleAuth::MintTicket => Some(self.ticket().await?),
            ConsoleAuth::Ticket(ticket) => Some(ticket),
        };

        let request = self.console_request(server, ticket.as_ref())?;
        debug!(server, with_ticket = ticket.is_some(), "opening console");

        let (stream, _response) = tokio_tungstenite::connect_async(request).await?;
        info!(server, "console connected");
        Ok(stream)
    }
}
