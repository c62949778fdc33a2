//! Recording transport for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use http::StatusCode;
use serde_json::Value;

use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::{Client, Credentials, Error, Result};

pub const ENDPOINT: &str = "http://localhost:42069";

/// Replays queued responses and remembers every request it was handed.
#[derive(Default)]
pub struct MockTransport {
    requests: Mutex<Vec<HttpRequest>>,
    responses: Mutex<VecDeque<Result<HttpResponse>>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_json(&self, status: u16, body: Value) {
        let status = StatusCode::from_u16(status).unwrap();
        self.push_response(HttpResponse::from_bytes(status, body.to_string()));
    }

    pub fn push_bytes(&self, status: u16, body: &'static [u8]) {
        let status = StatusCode::from_u16(status).unwrap();
        self.push_response(HttpResponse::from_bytes(status, body));
    }

    pub fn push_response(&self, response: HttpResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    pub fn push_error(&self, error: Error) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests().pop().expect("no request was sent")
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("no response queued for request")
    }
}

/// A client that already holds the session token `tok`.
pub fn authed_client(transport: &Arc<MockTransport>) -> Client {
    Client::with_transport(ENDPOINT, Credentials::token("tok"), transport.clone()).unwrap()
}

/// Header value as a string, for assertions.
pub fn header(request: &HttpRequest, name: &str) -> Option<String> {
    request
        .headers
        .get(name)
        .map(|v| v.to_str().unwrap().to_string())
}
