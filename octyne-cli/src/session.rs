//! A logged-in client for the length of one command.

use anyhow::{Context, Result};
use octyne_client::Client;
use tracing::{debug, warn};

use crate::config::OctyneConfig;

/// Wraps a [`Client`] that is ready to use.
///
/// With a configured token the client is used as-is. With a username and
/// password the session logs in on open and logs out again on [`close`],
/// so a command never leaves a token behind.
///
/// [`close`]: Session::close
pub struct Session {
    client: Client,
    owns_token: bool,
}

impl Session {
    pub async fn open(config: &OctyneConfig) -> Result<Self> {
        let credentials = config
            .credentials()
            .context("no credentials configured (set a username and password, or a token)")?;
        let client = Client::new(&config.url, credentials)
            .with_context(|| format!("cannot use control plane at {}", config.url))?;

        let owns_token = !client.is_authenticated();
        if owns_token {
            client
                .login()
                .await
                .with_context(|| format!("could not log in to {}", config.url))?;
            debug!("logged in for this command");
        }

        Ok(Self { client, owns_token })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Log out if this session logged in. Failures are only logged.
    pub async fn close(self) {
        if !self.owns_token {
            return;
        }
        if let Err(e) = self.client.logout().await {
            warn!(error = %e, "logout failed, the session token may still be valid");
        }
    }
}
