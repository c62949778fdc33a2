use std::path::PathBuf;

use clap::Args;
use octyne_client::Credentials;
use serde::{Deserialize, Serialize};

/// Default control plane address of a local Octyne install
pub const DEFAULT_URL: &str = "http://localhost:42069";

const REDACTED: &str = "[REDACTED]";

/// Connection settings given on the command line or through the environment
#[derive(Debug, Clone, Default, Args)]
pub struct ConnectionArgs {
    /// Control plane URL
    #[arg(long, env = "OCTYNE_URL", global = true)]
    pub url: Option<String>,

    /// Username to log in with
    #[arg(short, long, env = "OCTYNE_USERNAME", global = true)]
    pub username: Option<String>,

    /// Password to log in with
    #[arg(long, env = "OCTYNE_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Session token from an earlier `octyne login`
    #[arg(long, env = "OCTYNE_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Read this config file instead of the default one
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl ConnectionArgs {
    /// The settings as a config layer. Empty values count as unset.
    pub fn to_raw(&self) -> RawOctyneConfig {
        let set = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());
        RawOctyneConfig {
            url: set(&self.url),
            username: set(&self.username),
            password: set(&self.password),
            token: set(&self.token),
        }
    }
}

/// Configuration as stored in TOML files (optional fields for merging)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawOctyneConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OctyneConfig {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for OctyneConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            username: None,
            password: None,
            token: None,
        }
    }
}

impl OctyneConfig {
    /// Credentials for a session: a username/password pair if both are set, else the token.
    pub fn credentials(&self) -> octyne_client::Result<Credentials> {
        Credentials::from_parts(
            self.username.clone(),
            self.password.clone(),
            self.token.clone(),
        )
    }

    /// A copy safe to print, with the password and token masked.
    pub fn redacted(&self) -> Self {
        let mask = |value: &Option<String>| value.as_ref().map(|_| REDACTED.to_string());
        Self {
            url: self.url.clone(),
            username: self.username.clone(),
            password: mask(&self.password),
            token: mask(&self.token),
        }
    }
}
