//! `octyne files <name> [dir]`: list a directory.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Args;
use comfy_table::{Cell, Color};
use octyne_client::{Client, FileEntry};

use crate::config::OctyneConfig;
use crate::output::{format_size, print_json, table};
use crate::session::Session;

#[derive(Debug, Args)]
pub struct FilesArgs {
    /// Server name
    pub name: String,

    /// Directory inside the server's folder
    #[arg(default_value = "/")]
    pub directory: String,
}

pub async fn run(args: FilesArgs, config: &OctyneConfig, json: bool) -> Result<()> {
    let session = Session::open(config).await?;
    let result = list(session.client(), &args, json).await;
    session.close().await;
    result
}

async fn list(client: &Client, args: &FilesArgs, json: bool) -> Result<()> {
    let mut entries = client
        .list_files(&args.name, &args.directory)
        .await
        .with_context(|| format!("failed to list {} on {}", args.directory, args.name))?;
    sort_entries(&mut entries);

    if json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("{} is empty.", args.directory);
        return Ok(());
    }

    let mut table = table(&["Name", "Size", "Type", "Modified"]);
    for entry in &entries {
        let name = if entry.folder {
            Cell::new(format!("{}/", entry.name)).fg(Color::Blue)
        } else {
            Cell::new(&entry.name)
        };
        let size = if entry.folder {
            String::new()
        } else {
            format_size(entry.size)
        };
        let modified = format_modified(entry);
        table.add_row(vec![
            name,
            Cell::new(size),
            Cell::new(&entry.mime_type),
            Cell::new(modified),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Modification time in the local timezone, blank if out of range.
fn format_modified(entry: &FileEntry) -> String {
    entry
        .modified_at()
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

/// Folders first, then by name.
fn sort_entries(entries: &mut [FileEntry]) {
    entries.sort_by(|a, b| b.folder.cmp(&a.folder).then_with(|| a.name.cmp(&b.name)));
}
