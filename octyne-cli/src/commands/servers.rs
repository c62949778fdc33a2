//! `octyne servers`: list every managed server.

use anyhow::{Context, Result};
use comfy_table::Cell;
use octyne_client::Client;

use crate::config::OctyneConfig;
use crate::output::{print_json, status_cell, table};
use crate::session::Session;

pub async fn run(config: &OctyneConfig, json: bool) -> Result<()> {
    let session = Session::open(config).await?;
    let result = list(session.client(), json).await;
    session.close().await;
    result
}

async fn list(client: &Client, json: bool) -> Result<()> {
    let servers = client.list_servers().await.context("failed to list servers")?;

    if json {
        return print_json(&servers);
    }
    if servers.is_empty() {
        println!("No servers configured.");
        return Ok(());
    }

    let mut table = table(&["Server", "Status"]);
    for (name, status) in &servers {
        table.add_row(vec![Cell::new(name), status_cell(*status)]);
    }
    println!("{table}");
    Ok(())
}
