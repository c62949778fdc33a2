//! HTTP transport used by the client.
//!
//! [`HttpTransport`] is the seam between the session logic and the network.
//! [`ReqwestTransport`] is the production implementation; tests substitute
//! their own to observe exactly which requests reach the wire.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt};
use http::{HeaderMap, Method, StatusCode};
use url::Url;

use crate::{Error, Result};

/// A live response body, yielded chunk by chunk as it arrives.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// A request ready to be sent by a transport.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

/// A response whose body has not been read yet.
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: ByteStream,
}

impl HttpResponse {
    /// A response with an already-known body.
    pub fn from_bytes(status: StatusCode, body: impl Into<Bytes>) -> Self {
        let body: Bytes = body.into();
        Self {
            status,
            body: Box::pin(futures_util::stream::once(async move { Ok::<_, Error>(body) })),
        }
    }

    /// Read the whole body into memory.
    pub async fn bytes(mut self) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Sends HTTP requests on behalf of a [`Client`](crate::Client).
///
/// Implementations must not retry, and must surface network failures as
/// [`Error::Transport`]. Non-2xx responses are not errors at this layer.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// [`HttpTransport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured `reqwest::Client` (timeouts, proxies, TLS roots).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(Error::from));

        Ok(HttpResponse {
            status,
            body: Box::pin(body),
        })
    }
}
