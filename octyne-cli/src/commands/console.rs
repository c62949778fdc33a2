//! `octyne console <name>`: attach to a server's console.
//!
//! Console output goes to stdout; each line read from stdin is sent as a
//! command. Ctrl-C detaches without stopping the server.

use anyhow::{Context, Result};
use clap::Args;
use futures_util::{SinkExt, StreamExt};
use octyne_client::{Client, ConsoleAuth, ConsoleMessage};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::config::OctyneConfig;
use crate::session::Session;

#[derive(Debug, Args)]
pub struct ConsoleArgs {
    /// Server name
    pub name: String,

    /// Authenticate with a one-time ticket instead of the Authorization header
    #[arg(long)]
    pub ticket: bool,
}

pub async fn run(args: ConsoleArgs, config: &OctyneConfig) -> Result<()> {
    let session = Session::open(config).await?;
    let result = attach(session.client(), &args).await;
    session.close().await;
    result
}

async fn attach(client: &Client, args: &ConsoleArgs) -> Result<()> {
    let auth = ConsoleAuth::for_context(!args.ticket);
    let console = client
        .open_console(&args.name, auth)
        .await
        .with_context(|| format!("could not open the console of {}", args.name))?;
    info!(server = %args.name, "attached, press Ctrl-C to detach");

    let (mut sink, mut stream) = console.split();
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            message = stream.next() => match message {
                Some(Ok(ConsoleMessage::Text(text))) => {
                    let text = text.as_str();
                    stdout.write_all(text.as_bytes()).await?;
                    if !text.ends_with('\n') {
                        stdout.write_all(b"\n").await?;
                    }
                    stdout.flush().await?;
                }
                Some(Ok(ConsoleMessage::Close(_))) | None => {
                    info!("console closed by the control plane");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e).context("console connection failed"),
            },
            line = input.next_line(), if stdin_open => match line? {
                Some(line) => sink
                    .send(ConsoleMessage::Text(line.into()))
                    .await
                    .context("failed to send command")?,
                None => {
                    debug!("stdin closed, still streaming output");
                    stdin_open = false;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                let _ = sink.send(ConsoleMessage::Close(None)).await;
                break;
            }
        }
    }
    Ok(())
}
