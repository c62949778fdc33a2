//! Managed servers: listing, status and start/stop.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::client::{Client, RequestOptions};
use crate::{Error, Result};

/// Coarse state of a managed server, as reported by `/servers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ServerStatus {
    Offline,
    Online,
    Crashed,
}

impl TryFrom<u8> for ServerStatus {
    type Error = String;

    fn try_from(code: u8) -> std::result::Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Offline),
            1 => Ok(Self::Online),
            2 => Ok(Self::Crashed),
            other => Err(format!("unknown server status code {}", other)),
        }
    }
}

impl From<ServerStatus> for u8 {
    fn from(status: ServerStatus) -> Self {
        match status {
            ServerStatus::Offline => 0,
            ServerStatus::Online => 1,
            ServerStatus::Crashed => 2,
        }
    }
}

impl ServerStatus {
    pub fn is_online(self) -> bool {
        self == Self::Online
    }
}

impl std::fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Offline => "offline",
            Self::Online => "online",
            Self::Crashed => "crashed",
        };
        f.write_str(label)
    }
}

/// Detailed state of one server, from `GET /server/{name}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub status: ServerStatus,
    #[serde(default)]
    pub cpu_usage: f64,
    /// Bytes.
    #[serde(default)]
    pub memory_usage: f64,
    /// Bytes.
    #[serde(default)]
    pub total_memory: f64,
    /// Nanoseconds since the process started.
    #[serde(default)]
    pub uptime: u64,
    #[serde(default)]
    pub server_version: String,
}

#[derive(Debug, Deserialize)]
struct ServersResponse {
    servers: BTreeMap<String, ServerStatus>,
}

/// Body of `POST /server/{name}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServerAction {
    Start,
    Stop,
}

impl ServerAction {
    fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }
}

impl Client {
    /// List every managed server and its status.
    ///
    /// Accepts both the bare `{name: status}` map and the `{"servers": {...}}`
    /// envelope used by newer control planes.
    pub async fn list_servers(&self) -> Result<BTreeMap<String, ServerStatus>> {
        let reply = self
            .send_json(self.url(&["servers"])?, RequestOptions::get())
            .await?
            .ok_unless_error()?;

        let status = reply.status;
        let enveloped = reply.body.get("servers").is_some_and(serde_json::Value::is_object);
        let servers = if enveloped {
            serde_json::from_value::<ServersResponse>(reply.body).map(|r| r.servers)
        } else {
            serde_json::from_value(reply.body)
        }
        .map_err(|e| Error::request(format!("malformed server list: {}", e), status))?;

        debug!(count = servers.len(), "listed servers");
        Ok(servers)
    }

    /// Fetch the status and resource usage of one server.
    pub async fn get_server(&self, server: &str) -> Result<ServerInfo> {
        let reply = self
            .send_json(self.url(&["server", server])?, RequestOptions::get())
            .await?
            .require_field("status")?;

        let status = reply.status;
        serde_json::from_value(reply.body)
            .map_err(|e| Error::request(format!("malformed server info: {}", e), status))
    }

    /// Start a server.
    pub async fn start_server(&self, server: &str) -> Result<()> {
        self.server_action(server, ServerAction::Start).await
    }

    /// Stop a server.
    pub async fn stop_server(&self, server: &str) -> Result<()> {
        self.server_action(server, ServerAction::Stop).await
    }

    async fn server_action(&self, server: &str, action: ServerAction) -> Result<()> {
        self.send_json(
            self.url(&["server", server])?,
            RequestOptions::post().body(action.as_str()),
        )
        .await?
        .ok_unless_error()?;

        info!(server, action = action.as_str(), "server action accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::testing::{MockTransport, authed_client, header};
    use http::Method;
    use serde_json::json;

    #[tokio::test]
    async fn list_servers_parses_status_map() {
        let transport = MockTransport::new();
        transport.push_json(200, json!({"lobby": 1, "survival": 0, "creative": 2}));
        let client = authed_client(&transport);

        let servers = client.list_servers().await.unwrap();
        assert_eq!(servers["lobby"], ServerStatus::Online);
        assert_eq!(servers["survival"], ServerStatus::Offline);
        assert_eq!(servers["creative"], ServerStatus::Crashed);

        let request = transport.last_request();
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.url.path(), "/servers");
        assert_eq!(header(&request, "authorization").as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn list_servers_accepts_envelope() {
        let transport = MockTransport::new();
        transport.push_json(200, json!({"servers": {"lobby": 1}}));
        let client = authed_client(&transport);

        let servers = client.list_servers().await.unwrap();
        assert_eq!(servers.len(), 1);
        assert!(servers["lobby"].is_online());
    }

    #[tokio::test]
    async fn list_servers_rejects_unknown_status() {
        let transport = MockTransport::new();
        transport.push_json(200, json!({"lobby": 7}));
        let client = authed_client(&transport);

        let err = client.list_servers().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Request);
    }

    #[tokio::test]
    async fn get_server_parses_info() {
        let transport = MockTransport::new();
        transport.push_json(
            200,
            json!({
                "status": 1,
                "cpuUsage": 12.5,
                "memoryUsage": 1024.0,
                "totalMemory": 8192,
                "uptime": 3600,
                "serverVersion": "1.20.4"
            }),
        );
        let client = authed_client(&transport);

        let info = client.get_server("lobby").await.unwrap();
        assert_eq!(info.status, ServerStatus::Online);
        assert_eq!(info.cpu_usage, 12.5);
        assert_eq!(info.total_memory, 8192.0);
        assert_eq!(info.uptime, 3600);
        assert_eq!(info.server_version, "1.20.4");
        assert_eq!(transport.last_request().url.path(), "/server/lobby");
    }

    #[tokio::test]
    async fn get_server_accepts_offline_status() {
        let transport = MockTransport::new();
        transport.push_json(200, json!({"status": 0}));
        let client = authed_client(&transport);

        let info = client.get_server("lobby").await.unwrap();
        assert_eq!(info.status, ServerStatus::Offline);
        assert_eq!(info.uptime, 0);
    }

    #[tokio::test]
    async fn get_server_surfaces_error() {
        let transport = MockTransport::new();
        transport.push_json(404, json!({"error": "This server does not exist!"}));
        let client = authed_client(&transport);

        let err = client.get_server("nope").await.unwrap_err();
        assert_eq!(err.message(), Some("This server does not exist!"));
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn start_and_stop_send_literal_bodies() {
        let transport = MockTransport::new();
        transport.push_json(200, json!({"success": true}));
        transport.push_json(200, json!({"success": true}));
        let client = authed_client(&transport);

        client.start_server("lobby").await.unwrap();
        client.stop_server("lobby").await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].url.path(), "/server/lobby");
        assert_eq!(requests[0].body.as_deref(), Some("start"));
        assert_eq!(requests[1].body.as_deref(), Some("stop"));
    }

    #[tokio::test]
    async fn start_and_stop_reject_with_exact_message() {
        for stop in [false, true] {
            let transport = MockTransport::new();
            transport.push_json(200, json!({"error": "X"}));
            let client = authed_client(&transport);

            let result = if stop {
                client.stop_server("lobby").await
            } else {
                client.start_server("lobby").await
            };
            let err = result.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Request);
            assert_eq!(err.message(), Some("X"));
        }
    }

    #[test]
    fn status_round_trips_through_code() {
        assert_eq!(serde_json::to_value(ServerStatus::Crashed).unwrap(), json!(2));
        assert!(serde_json::from_value::<ServerStatus>(json!(3)).is_err());
    }

    #[test]
    fn status_display_is_lowercase() {
        assert_eq!(ServerStatus::Crashed.to_string(), "crashed");
        assert_eq!(ServerStatus::Offline.to_string(), "offline");
    }
}
