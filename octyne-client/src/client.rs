//! The session client.
//!
//! A [`Client`] holds the control plane endpoint, the credential material it
//! was built with, and at most one session token. Every authenticated call
//! goes through [`Client::request`] (or its internal siblings), which attaches
//! the token as the `Authorization` header and never retries.
//!
//! # Example
//!
//! ```ignore
//! use octyne_client::{Client, Credentials};
//!
//! let client = Client::new("http://localhost:42069", Credentials::password("admin", "hunter2"))?;
//! client.login().await?;
//! let servers = client.list_servers().await?;
//! client.logout().await?;
//! ```

use std::sync::{Arc, PoisonError, RwLock};

use http::header::{AUTHORIZATION, HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::{Credentials, SessionToken, Ticket};
use crate::response::ApiReply;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
use crate::{Error, Result};

/// Method, extra headers and body for [`Client::request`].
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn patch() -> Self {
        Self::new(Method::PATCH)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Add a header. An `Authorization` header set here is always replaced
    /// by the session token.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// The ordinarily-visible part of a [`Client`]: no secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientInfo {
    pub endpoint: String,
    pub username: Option<String>,
}

/// An authenticated session with an Octyne control plane.
///
/// The password and session token are private and redacted from `Debug` and
/// `Serialize`; only the endpoint and username are ever shown.
///
/// Calls may run concurrently on a shared `&Client`. The token is read once
/// at the start of each call, so a concurrent [`logout`](Self::logout) can
/// only cause an in-flight call to be rejected by the control plane.
pub struct Client {
    endpoint: Url,
    username: Option<String>,
    password: Option<SecretString>,
    token: RwLock<Option<SessionToken>>,
    transport: Arc<dyn HttpTransport>,
}

impl Client {
    /// Create a client using the default reqwest transport.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if the endpoint is not an `http`/`https`
    /// URL or the credentials are incomplete.
    pub fn new(endpoint: &str, credentials: Credentials) -> Result<Self> {
        Self::with_transport(endpoint, credentials, Arc::new(ReqwestTransport::new()))
    }

    /// Create a client that sends requests through `transport`.
    pub fn with_transport(
        endpoint: &str,
        credentials: Credentials,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        let endpoint = parse_endpoint(endpoint)?;
        credentials.validate()?;

        let (username, password, token) = match credentials {
            Credentials::Password { username, password } => (Some(username), Some(password), None),
            Credentials::Token(token) => (None, None, Some(token)),
        };

        Ok(Self {
            endpoint,
            username,
            password,
            token: RwLock::new(token),
            transport,
        })
    }

    /// The control plane base URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Endpoint and username, safe to log or serialize.
    pub fn info(&self) -> ClientInfo {
        ClientInfo {
            endpoint: self.endpoint.to_string(),
            username: self.username.clone(),
        }
    }

    /// Whether a session token is currently held.
    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Replace the session token, e.g. with one obtained by another process.
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) =
            Some(SessionToken::new(token));
    }

    /// A copy of the current session token.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotAuthenticated` if no token is held.
    pub fn session_token(&self) -> Result<SessionToken> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(Error::NotAuthenticated)
    }

    fn clear_token(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Log in with the stored username and password.
    ///
    /// Credentials travel as `Username`/`Password` headers. On success the
    /// returned token replaces any token already held.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if the client was built from a token,
    /// `Error::Authentication` if the control plane rejects the credentials or
    /// answers with something other than JSON.
    pub async fn login(&self) -> Result<()> {
        let (Some(username), Some(password)) = (&self.username, &self.password) else {
            return Err(Error::Configuration(
                "logging in requires a username and password".to_string(),
            ));
        };

        let mut request = HttpRequest::new(Method::POST, self.url(&["login"])?);
        request
            .headers
            .insert(HeaderName::from_static("username"), header_value(username, "username")?);
        request.headers.insert(
            HeaderName::from_static("password"),
            sensitive_header_value(password.expose_secret(), "password")?,
        );

        debug!(username = %username, "logging in");
        let reply = ApiReply::read(self.transport.execute(request).await?)
            .await
            .map_err(|e| unreadable_as(e, authentication_error))?;

        match reply.str_field("token").filter(|token| !token.is_empty()) {
            Some(token) => {
                self.set_token(token);
                info!(username = %username, "logged in");
                Ok(())
            }
            None => {
                warn!(username = %username, status = reply.status, "login rejected");
                Err(Error::Authentication {
                    message: reply.rejection_message(),
                    status: Some(reply.status),
                })
            }
        }
    }

    /// Invalidate the session token on the control plane and forget it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Authentication` if the control plane does not confirm
    /// the logout. The token is kept in that case.
    pub async fn logout(&self) -> Result<()> {
        let reply = self
            .send_json(self.url(&["logout"])?, RequestOptions::post())
            .await
            .map_err(|e| unreadable_as(e, authentication_error))?;

        let confirmed = reply.body.get("success").and_then(Value::as_bool) == Some(true);
        if confirmed && reply.error_message().is_none() {
            self.clear_token();
            info!("logged out");
            Ok(())
        } else {
            Err(Error::Authentication {
                message: reply.rejection_message(),
                status: Some(reply.status),
            })
        }
    }

    /// Mint a one-time ticket for a connection that cannot send headers.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotAuthenticated` without a session token, and
    /// `Error::Ticket` if the control plane refuses or answers with something
    /// other than JSON.
    pub async fn ticket(&self) -> Result<Ticket> {
        let reply = self
            .send_json(self.url(&["ott"])?, RequestOptions::get())
            .await
            .map_err(|e| unreadable_as(e, ticket_error))?;

        match reply.str_field("ticket").filter(|ticket| !ticket.is_empty()) {
            Some(ticket) => {
                debug!("ticket issued");
                Ok(Ticket::new(ticket))
            }
            None => Err(Error::Ticket {
                message: reply.rejection_message(),
                status: Some(reply.status),
            }),
        }
    }

    /// Send an authenticated request and return the parsed JSON body as-is.
    ///
    /// A non-2xx status is not an error here; callers inspect the body's
    /// `error` field. The `Authorization` header always carries the session
    /// token, even if `options` sets one.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotAuthenticated` before touching the network if no
    /// token is held, `Error::Transport` on network failure, and
    /// `Error::Request` if the body is not JSON.
    pub async fn request(&self, url: Url, options: RequestOptions) -> Result<Value> {
        Ok(self.send_json(url, options).await?.body)
    }

    /// [`request`](Self::request), keeping the HTTP status alongside the body.
    pub(crate) async fn send_json(&self, url: Url, options: RequestOptions) -> Result<ApiReply> {
        let response = self.send(url, options).await?;
        ApiReply::read(response).await
    }

    /// Send an authenticated request and hand back the unread response.
    pub(crate) async fn send(&self, url: Url, options: RequestOptions) -> Result<HttpResponse> {
        let token = self.session_token()?;

        let mut request = HttpRequest::new(options.method, url);
        request.headers = options.headers;
        request.headers.insert(AUTHORIZATION, authorization(&token)?);
        request.body = options.body;

        debug!(method = %request.method, path = request.url.path(), "sending request");
        self.transport.execute(request).await
    }

    /// Build `<endpoint>/<segments...>`, percent-encoding each segment.
    pub fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|_| Error::Configuration("endpoint cannot be a base URL".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Like [`url`](Self::url), with a `path=<encoded>` query.
    pub(crate) fn url_with_path(&self, segments: &[&str], path: &str) -> Result<Url> {
        let mut url = self.url(segments)?;
        url.set_query(Some(&format!("path={}", urlencoding::encode(path))));
        Ok(url)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.endpoint.as_str())
            .field("username", &self.username)
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl Serialize for Client {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.info().serialize(serializer)
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint)
        .map_err(|e| Error::Configuration(format!("invalid endpoint {:?}: {}", endpoint, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Configuration(format!(
            "endpoint must be an http or https URL, got {:?}",
            url.scheme()
        )));
    }
    if url.cannot_be_a_base() {
        return Err(Error::Configuration(format!(
            "endpoint {:?} cannot be a base URL",
            endpoint
        )));
    }
    Ok(url)
}

/// Re-kind an unreadable reply (`Error::Request`) as the failure of the call
/// that received it. Other errors pass through.
fn unreadable_as(err: Error, kind: fn(String, Option<u16>) -> Error) -> Error {
    match err {
        Error::Request { message, status } => kind(message, status),
        other => other,
    }
}

fn authentication_error(message: String, status: Option<u16>) -> Error {
    Error::Authentication { message, status }
}

fn ticket_error(message: String, status: Option<u16>) -> Error {
    Error::Ticket { message, status }
}

fn header_value(value: &str, what: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| {
        Error::Configuration(format!("{} contains characters not allowed in a header", what))
    })
}

fn sensitive_header_value(value: &str, what: &str) -> Result<HeaderValue> {
    let mut value = header_value(value, what)?;
    value.set_sensitive(true);
    Ok(value)
}

pub(crate) fn authorization(token: &SessionToken) -> Result<HeaderValue> {
    sensitive_header_value(token.expose_secret(), "session token")
}
