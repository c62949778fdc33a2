//! `octyne server <name> [status|start|stop]`.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use comfy_table::Cell;
use octyne_client::{Client, ServerInfo};

use crate::config::OctyneConfig;
use crate::output::{format_size, format_uptime, print_json, status_cell, table};
use crate::session::Session;

#[derive(Debug, Args)]
pub struct ServerArgs {
    /// Server name
    pub name: String,

    #[command(subcommand)]
    pub action: Option<ServerAction>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ServerAction {
    /// Show status and resource usage (default)
    Status,
    /// Start the server
    Start,
    /// Stop the server
    Stop,
}

pub async fn run(args: ServerArgs, config: &OctyneConfig, json: bool) -> Result<()> {
    let session = Session::open(config).await?;
    let result = execute(session.client(), &args, json).await;
    session.close().await;
    result
}

async fn execute(client: &Client, args: &ServerArgs, json: bool) -> Result<()> {
    let name = args.name.as_str();
    match args.action.unwrap_or(ServerAction::Status) {
        ServerAction::Status => {
            let info = client
                .get_server(name)
                .await
                .with_context(|| format!("failed to get status of {}", name))?;
            if json {
                print_json(&info)
            } else {
                print_info(name, &info);
                Ok(())
            }
        }
        ServerAction::Start => {
            client
                .start_server(name)
                .await
                .with_context(|| format!("failed to start {}", name))?;
            println!("Started {}.", name);
            Ok(())
        }
        ServerAction::Stop => {
            client
                .stop_server(name)
                .await
                .with_context(|| format!("failed to stop {}", name))?;
            println!("Stopped {}.", name);
            Ok(())
        }
    }
}

fn print_info(name: &str, info: &ServerInfo) {
    let mut table = table(&["Server", name]);
    table.add_row(vec![Cell::new("Status"), status_cell(info.status)]);

    // Usage figures are only meaningful while the process runs.
    if info.status.is_online() {
        table.add_row(vec![
            Cell::new("CPU"),
            Cell::new(format!("{:.1}%", info.cpu_usage)),
        ]);
        table.add_row(vec![
            Cell::new("Memory"),
            Cell::new(format!(
                "{} / {}",
                format_size(info.memory_usage as u64),
                format_size(info.total_memory as u64)
            )),
        ]);
        table.add_row(vec![
            Cell::new("Uptime"),
            Cell::new(format_uptime(info.uptime / 1_000_000_000)),
        ]);
    }
    if !info.server_version.is_empty() {
        table.add_row(vec![Cell::new("Version"), Cell::new(&info.server_version)]);
    }
    println!("{table}");
}
