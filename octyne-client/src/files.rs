//! File operations on a server's working directory.
//!
//! Paths are sent percent-encoded in a `path` query parameter. Move and copy
//! use a small newline-delimited body, `<op>\n<source>\n<destination>`.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::{Client, RequestOptions};
use crate::response::ApiReply;
use crate::transport::HttpResponse;
use crate::{Error, Result};

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    pub size: u64,
    pub folder: bool,
    #[serde(default)]
    pub mime_type: String,
    /// Seconds since the Unix epoch.
    #[serde(default)]
    pub last_modified: i64,
}

impl FileEntry {
    /// Modification time, if the timestamp is representable.
    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.last_modified, 0)
    }
}

#[derive(Debug, Deserialize)]
struct ListingResponse {
    contents: Vec<FileEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileOp {
    Move,
    Copy,
}

impl FileOp {
    fn body(self, source: &str, destination: &str) -> String {
        let op = match self {
            Self::Move => "mv",
            Self::Copy => "cp",
        };
        format!("{}\n{}\n{}", op, source, destination)
    }
}

/// `<parent of path>/<name>`, using `/` separators.
fn sibling_path(path: &str, name: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => format!("{}/{}", &trimmed[..idx], name),
        None if path.starts_with('/') => format!("/{}", name),
        None => name.to_string(),
    }
}

impl Client {
    /// List the contents of a directory.
    pub async fn list_files(&self, server: &str, directory: &str) -> Result<Vec<FileEntry>> {
        let url = self.url_with_path(&["server", server, "files"], directory)?;
        let reply = self
            .send_json(url, RequestOptions::get())
            .await?
            .require_field("contents")?;

        let status = reply.status;
        let listing: ListingResponse = serde_json::from_value(reply.body)
            .map_err(|e| Error::request(format!("malformed directory listing: {}", e), status))?;

        debug!(server, directory, count = listing.contents.len(), "listed files");
        Ok(listing.contents)
    }

    /// Download a file into memory.
    ///
    /// A successful response is returned verbatim, even if it happens to be
    /// JSON. On a failed response, a JSON body with an `error` field is
    /// reported as the server's rejection; anything else is returned as-is.
    pub async fn get_file(&self, server: &str, path: &str) -> Result<Bytes> {
        let response = self.stream_file(server, path).await?;
        let status = response.status;
        let bytes = response.bytes().await?;

        if status.is_success() {
            debug!(server, path, size = bytes.len(), "downloaded file");
            return Ok(bytes);
        }

        if let Ok(body) = serde_json::from_slice::<Value>(&bytes) {
            let reply = ApiReply {
                status: status.as_u16(),
                body,
            };
            if reply.error_message().is_some() {
                return Err(reply.rejection());
            }
        }

        warn!(
            server,
            path,
            status = status.as_u16(),
            "download failed without an error message, returning body"
        );
        Ok(bytes)
    }

    /// Open a file download without buffering it.
    ///
    /// The response is handed back as soon as headers arrive; the caller owns
    /// the body stream and decides what a non-2xx status means.
    pub async fn stream_file(&self, server: &str, path: &str) -> Result<HttpResponse> {
        let url = self.url_with_path(&["server", server, "file"], path)?;
        self.send(url, RequestOptions::get()).await
    }

    /// Create a directory.
    pub async fn create_folder(&self, server: &str, directory: &str) -> Result<()> {
        let url = self.url_with_path(&["server", server, "folder"], directory)?;
        self.send_json(url, RequestOptions::post())
            .await?
            .ok_unless_error()?;
        info!(server, directory, "created folder");
        Ok(())
    }

    /// Move a file or folder.
    pub async fn move_file(&self, server: &str, source: &str, destination: &str) -> Result<()> {
        self.file_op(server, FileOp::Move, source, destination).await
    }

    /// Copy a file or folder.
    pub async fn copy_file(&self, server: &str, source: &str, destination: &str) -> Result<()> {
        self.file_op(server, FileOp::Copy, source, destination).await
    }

    /// Rename a file in place: a move to `new_name` in the same directory.
    pub async fn rename_file(&self, server: &str, path: &str, new_name: &str) -> Result<()> {
        let destination = sibling_path(path, new_name);
        self.move_file(server, path, &destination).await
    }

    /// Delete a file or folder.
    pub async fn delete_file(&self, server: &str, path: &str) -> Result<()> {
        let url = self.url_with_path(&["server", server, "file"], path)?;
        self.send_json(url, RequestOptions::delete())
            .await?
            .ok_unless_error()?;
        info!(server, path, "deleted file");
        Ok(())
    }

    async fn file_op(
        &self,
        server: &str,
        op: FileOp,
        source: &str,
        destination: &str,
    ) -> Result<()> {
        let url = self.url(&["server", server, "file"])?;
        self.send_json(url, RequestOptions::patch().body(op.body(source, destination)))
            .await?
            .ok_unless_error()?;
        info!(server, source, destination, op = ?op, "file operation accepted");
        Ok(())
    }
}
