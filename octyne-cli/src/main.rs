use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod output;
mod session;

use config::{ConfigLoader, ConnectionArgs};

#[derive(Parser)]
#[command(name = "octyne", about = "Command-line client for the Octyne process manager")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    connection: ConnectionArgs,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and print a session token
    Login,
    /// Invalidate a session token
    Logout,
    /// List servers and their status
    Servers,
    /// Show, start or stop a server
    Server(commands::server::ServerArgs),
    /// Attach to a server's console
    Console(commands::console::ConsoleArgs),
    /// List a directory
    Files(commands::files::FilesArgs),
    /// Download, move, copy, rename or delete a file
    File(commands::file::FileArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so `octyne file cat` output stays clean.
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let load = || ConfigLoader::load(&cli.connection);
    match cli.command {
        Commands::Login => commands::auth::login(&load()?).await,
        Commands::Logout => commands::auth::logout(&load()?).await,
        Commands::Servers => commands::servers::run(&load()?, cli.json).await,
        Commands::Server(args) => commands::server::run(args, &load()?, cli.json).await,
        Commands::Console(args) => commands::console::run(args, &load()?).await,
        Commands::Files(args) => commands::files::run(args, &load()?, cli.json).await,
        Commands::File(args) => commands::file::run(args, &load()?).await,
        Commands::Config(args) => commands::config::run(args, &cli.connection),
    }
}
