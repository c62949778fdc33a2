//! In-process Octyne control plane for integration tests.
//!
//! Serves the HTTP API and console WebSocket on `127.0.0.1:0` and records
//! what each request carried so tests can assert on the wire format.
//!
//! Note: some helpers look unused because each test file compiles this
//! module separately.

#![allow(dead_code)]

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use octyne_client::{Client, Credentials};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "hunter2";

pub const NOT_AUTHENTICATED: &str = "You are not authenticated to access this resource!";
pub const NO_SUCH_SERVER: &str = "This server does not exist!";
pub const NO_SUCH_FILE: &str = "The file requested does not exist!";

type Reply = (StatusCode, Json<Value>);

/// A console handshake as the control plane saw it.
#[derive(Debug, Clone)]
pub struct Handshake {
    pub server: String,
    pub ticket: Option<String>,
    pub authorization: Option<String>,
}

/// Everything the control plane knows and has seen.
#[derive(Debug, Default)]
pub struct ControlPlaneState {
    pub tokens: HashSet<String>,
    pub tickets: HashSet<String>,
    /// `Authorization` header of every authenticated HTTP request.
    pub authorizations: Vec<String>,
    pub actions: Vec<(String, String)>,
    pub listed: Vec<String>,
    pub folders: Vec<String>,
    pub file_ops: Vec<String>,
    pub deleted: Vec<String>,
    pub handshakes: Vec<Handshake>,
    issued: u32,
}

impl ControlPlaneState {
    fn issue(&mut self, prefix: &str) -> String {
        self.issued += 1;
        format!("{}-{}", prefix, self.issued)
    }
}

type Shared = Arc<Mutex<ControlPlaneState>>;

/// A running mock control plane.
pub struct ControlPlane {
    pub addr: SocketAddr,
    state: Shared,
}

impl ControlPlane {
    /// Bind to an ephemeral port and serve in the background.
    pub async fn start() -> Self {
        let state = Shared::default();
        let app = router(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// A client holding the right username and password, not yet logged in.
    pub fn client(&self) -> Client {
        Client::new(&self.endpoint(), Credentials::password(USERNAME, PASSWORD)).unwrap()
    }

    /// A client that has already logged in.
    pub async fn logged_in_client(&self) -> Client {
        let client = self.client();
        client.login().await.unwrap();
        client
    }

    pub fn state(&self) -> MutexGuard<'_, ControlPlaneState> {
        self.state.lock().unwrap()
    }

    /// Forget every session, as a restart or a concurrent logout would.
    pub fn revoke_all_sessions(&self) {
        self.state().tokens.clear();
    }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/ott", get(ticket))
        .route("/servers", get(servers))
        .route("/server/:name", get(server_info).post(server_action))
        .route("/server/:name/files", get(list_files))
        .route(
            "/server/:name/file",
            get(download).patch(file_op).delete(delete_file),
        )
        .route("/server/:name/folder", post(create_folder))
        .route("/server/:name/console", get(console))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct PathQuery {
    path: String,
}

#[derive(Debug, Deserialize)]
struct TicketQuery {
    ticket: Option<String>,
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn rejected(status: StatusCode, message: &str) -> Reply {
    (status, Json(json!({ "error": message })))
}

fn success() -> Json<Value> {
    Json(json!({ "success": true }))
}

/// The caller's session token, if the control plane knows it.
fn authorize(state: &Shared, headers: &HeaderMap) -> Result<String, Reply> {
    let token = header(headers, "authorization");
    let mut state = state.lock().unwrap();
    if let Some(token) = &token {
        state.authorizations.push(token.clone());
    }
    match token {
        Some(token) if state.tokens.contains(&token) => Ok(token),
        _ => Err(rejected(StatusCode::UNAUTHORIZED, NOT_AUTHENTICATED)),
    }
}

async fn login(State(state): State<Shared>, headers: HeaderMap) -> Result<Json<Value>, Reply> {
    let username = header(&headers, "username");
    let password = header(&headers, "password");
    if username.as_deref() != Some(USERNAME) || password.as_deref() != Some(PASSWORD) {
        return Err(rejected(
            StatusCode::UNAUTHORIZED,
            "Invalid username or password!",
        ));
    }

    let mut state = state.lock().unwrap();
    let token = state.issue("token");
    state.tokens.insert(token.clone());
    Ok(Json(json!({ "token": token })))
}

async fn logout(State(state): State<Shared>, headers: HeaderMap) -> Result<Json<Value>, Reply> {
    let token = authorize(&state, &headers)?;
    state.lock().unwrap().tokens.remove(&token);
    Ok(success())
}

async fn ticket(State(state): State<Shared>, headers: HeaderMap) -> Result<Json<Value>, Reply> {
    authorize(&state, &headers)?;
    let mut state = state.lock().unwrap();
    let ticket = state.issue("ticket");
    state.tickets.insert(ticket.clone());
    Ok(Json(json!({ "ticket": ticket })))
}

async fn servers(State(state): State<Shared>, headers: HeaderMap) -> Result<Json<Value>, Reply> {
    authorize(&state, &headers)?;
    Ok(Json(json!({
        "servers": { "lobby": 1, "survival": 0, "creative": 2 }
    })))
}

async fn server_info(
    State(state): State<Shared>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, Reply> {
    authorize(&state, &headers)?;
    match name.as_str() {
        "lobby" => Ok(Json(json!({
            "status": 1,
            "cpuUsage": 3.5,
            "memoryUsage": 512.0,
            "totalMemory": 4096.0,
            "uptime": 120,
            "serverVersion": "1.20.4"
        }))),
        "survival" => Ok(Json(json!({ "status": 0 }))),
        _ => Err(rejected(StatusCode::NOT_FOUND, NO_SUCH_SERVER)),
    }
}

async fn server_action(
    State(state): State<Shared>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Value>, Reply> {
    authorize(&state, &headers)?;
    if name != "lobby" && name != "survival" {
        return Err(rejected(StatusCode::NOT_FOUND, NO_SUCH_SERVER));
    }
    match body.as_str() {
        "start" | "stop" => {
            state.lock().unwrap().actions.push((name, body));
            Ok(success())
        }
        _ => Err(rejected(
            StatusCode::BAD_REQUEST,
            "Invalid operation requested!",
        )),
    }
}

async fn list_files(
    State(state): State<Shared>,
    Query(query): Query<PathQuery>,
    headers: HeaderMap,
) -> Result<Json<Value>, Reply> {
    authorize(&state, &headers)?;
    state.lock().unwrap().listed.push(query.path.clone());
    if query.path.starts_with("/missing") {
        return Err(rejected(
            StatusCode::BAD_REQUEST,
            "This folder does not exist!",
        ));
    }
    Ok(Json(json!({
        "contents": [
            {
                "name": "world",
                "size": 0,
                "folder": true,
                "mimeType": "inode/directory",
                "lastModified": 1_700_000_000
            },
            {
                "name": "server.properties",
                "size": 11,
                "folder": false,
                "mimeType": "text/plain",
                "lastModified": 1_700_000_100
            }
        ]
    })))
}

async fn download(
    State(state): State<Shared>,
    Query(query): Query<PathQuery>,
    headers: HeaderMap,
) -> Response {
    if let Err(reply) = authorize(&state, &headers) {
        return reply.into_response();
    }
    match query.path.as_str() {
        "/server.properties" => (StatusCode::OK, "motd=hello\n").into_response(),
        // A file whose contents look like an error reply.
        "/ops.json" => (StatusCode::OK, r#"{"error":"not really"}"#).into_response(),
        "/broken" => (StatusCode::INTERNAL_SERVER_ERROR, "stack trace").into_response(),
        _ => rejected(StatusCode::NOT_FOUND, NO_SUCH_FILE).into_response(),
    }
}

async fn file_op(
    State(state): State<Shared>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Value>, Reply> {
    authorize(&state, &headers)?;
    let mut lines = body.split('\n');
    let (Some(op), Some(_), Some(_), None) = (lines.next(), lines.next(), lines.next(), lines.next())
    else {
        return Err(rejected(StatusCode::BAD_REQUEST, "Invalid body!"));
    };
    if op != "mv" && op != "cp" {
        return Err(rejected(
            StatusCode::BAD_REQUEST,
            "Invalid operation requested!",
        ));
    }
    state.lock().unwrap().file_ops.push(body);
    Ok(success())
}

async fn delete_file(
    State(state): State<Shared>,
    Query(query): Query<PathQuery>,
    headers: HeaderMap,
) -> Result<Json<Value>, Reply> {
    authorize(&state, &headers)?;
    if query.path == "/" {
        return Err(rejected(
            StatusCode::BAD_REQUEST,
            "Refusing to delete the server folder!",
        ));
    }
    state.lock().unwrap().deleted.push(query.path);
    Ok(success())
}

async fn create_folder(
    State(state): State<Shared>,
    Query(query): Query<PathQuery>,
    headers: HeaderMap,
) -> Result<Json<Value>, Reply> {
    authorize(&state, &headers)?;
    state.lock().unwrap().folders.push(query.path);
    Ok(success())
}

async fn console(
    State(state): State<Shared>,
    Path(name): Path<String>,
    Query(query): Query<TicketQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let authorization = header(&headers, "authorization");
    let allowed = {
        let mut state = state.lock().unwrap();
        state.handshakes.push(Handshake {
            server: name.clone(),
            ticket: query.ticket.clone(),
            authorization: authorization.clone(),
        });
        match &query.ticket {
            // Tickets are single use.
            Some(ticket) => state.tickets.remove(ticket),
            None => authorization.is_some_and(|token| state.tokens.contains(&token)),
        }
    };

    if !allowed {
        return rejected(StatusCode::UNAUTHORIZED, NOT_AUTHENTICATED).into_response();
    }
    ws.on_upgrade(move |socket| run_console(socket, name))
}

/// Greet, then echo every command back prefixed with `> `.
async fn run_console(mut socket: WebSocket, name: String) {
    if socket
        .send(Message::Text(format!("console for {}", name)))
        .await
        .is_err()
    {
        return;
    }
    while let Some(Ok(message)) = socket.recv().await {
        if let Message::Text(command) = message
            && socket
                .send(Message::Text(format!("> {}", command)))
                .await
                .is_err()
        {
            break;
        }
    }
}
