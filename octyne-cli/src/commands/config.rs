use crate::config::{ConfigLoader, ConnectionArgs};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration, secrets redacted
    Show,
    /// Show the configuration file path
    Path,
}

pub fn run(args: ConfigArgs, connection: &ConnectionArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(connection),
        ConfigCommands::Path => show_path(connection),
    }
}

fn show_config(connection: &ConnectionArgs) -> Result<()> {
    let config = ConfigLoader::load(connection)?;
    let toml_str = toml::to_string_pretty(&config.redacted())?;
    println!("{}", toml_str);
    Ok(())
}

fn show_path(connection: &ConnectionArgs) -> Result<()> {
    match ConfigLoader::config_path(connection) {
        Some(path) if path.exists() => println!("{}", path.display()),
        Some(path) => println!("{} (not created)", path.display()),
        None => println!("(no config directory on this platform)"),
    }
    Ok(())
}
