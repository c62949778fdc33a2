//! `octyne file <name> <operation>`: single-file operations.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use futures_util::StreamExt;
use octyne_client::Client;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::config::OctyneConfig;
use crate::session::Session;

#[derive(Debug, Args)]
pub struct FileArgs {
    /// Server name
    pub name: String,

    #[command(subcommand)]
    pub command: FileCommand,
}

#[derive(Debug, Subcommand)]
pub enum FileCommand {
    /// Download a file to stdout or to a local path
    Cat {
        path: String,

        /// Write to this local file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Create a folder
    Mkdir { path: String },
    /// Move a file or folder
    Mv { source: String, destination: String },
    /// Copy a file or folder
    Cp { source: String, destination: String },
    /// Rename a file or folder in place
    Rename { path: String, new_name: String },
    /// Delete a file or folder
    Rm { path: String },
}

pub async fn run(args: FileArgs, config: &OctyneConfig) -> Result<()> {
    let session = Session::open(config).await?;
    let result = execute(session.client(), &args.name, args.command).await;
    session.close().await;
    result
}

async fn execute(client: &Client, server: &str, command: FileCommand) -> Result<()> {
    match command {
        FileCommand::Cat { path, output } => cat(client, server, &path, output).await,
        FileCommand::Mkdir { path } => {
            client
                .create_folder(server, &path)
                .await
                .with_context(|| format!("failed to create {}", path))?;
            println!("Created {}.", path);
            Ok(())
        }
        FileCommand::Mv {
            source,
            destination,
        } => {
            client
                .move_file(server, &source, &destination)
                .await
                .with_context(|| format!("failed to move {}", source))?;
            println!("Moved {} to {}.", source, destination);
            Ok(())
        }
        FileCommand::Cp {
            source,
            destination,
        } => {
            client
                .copy_file(server, &source, &destination)
                .await
                .with_context(|| format!("failed to copy {}", source))?;
            println!("Copied {} to {}.", source, destination);
            Ok(())
        }
        FileCommand::Rename { path, new_name } => {
            client
                .rename_file(server, &path, &new_name)
                .await
                .with_context(|| format!("failed to rename {}", path))?;
            println!("Renamed {} to {}.", path, new_name);
            Ok(())
        }
        FileCommand::Rm { path } => {
            client
                .delete_file(server, &path)
                .await
                .with_context(|| format!("failed to delete {}", path))?;
            println!("Deleted {}.", path);
            Ok(())
        }
    }
}

/// Stream a download without buffering it, so large files work.
async fn cat(client: &Client, server: &str, path: &str, output: Option<PathBuf>) -> Result<()> {
    let response = client
        .stream_file(server, path)
        .await
        .with_context(|| format!("failed to download {}", path))?;

    let status = response.status;
    if !status.is_success() {
        let body = response.bytes().await?;
        bail!(
            "failed to download {}: {}",
            path,
            download_error(status.as_u16(), &body)
        );
    }

    let mut writer: Box<dyn AsyncWrite + Unpin + Send> = match &output {
        Some(local) => Box::new(
            tokio::fs::File::create(local)
                .await
                .with_context(|| format!("cannot write {}", local.display()))?,
        ),
        None => Box::new(tokio::io::stdout()),
    };

    let mut body = response.body;
    let mut written = 0usize;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.with_context(|| format!("download of {} interrupted", path))?;
        writer.write_all(&chunk).await?;
        written += chunk.len();
    }
    writer.flush().await?;

    debug!(path, bytes = written, "download complete");
    Ok(())
}

/// Describe a failed download from its status and body.
fn download_error(status: u16, body: &[u8]) -> String {
    let message = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string());

    if message.is_empty() {
        format!("HTTP {}", status)
    } else {
        format!("{} (HTTP {})", message, status)
    }
}
