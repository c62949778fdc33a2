//! `octyne login` and `octyne logout`.

use anyhow::{Context, Result, bail};
use octyne_client::{Client, Credentials};
use tracing::info;

use crate::config::OctyneConfig;

/// Log in with the configured username and password and print the token.
///
/// The token is not stored; export it as `OCTYNE_TOKEN` to reuse it.
pub async fn login(config: &OctyneConfig) -> Result<()> {
    let (Some(username), Some(password)) = (&config.username, &config.password) else {
        bail!("login needs a username and password (--username/--password or OCTYNE_USERNAME/OCTYNE_PASSWORD)");
    };

    let client = Client::new(&config.url, Credentials::password(username, password))
        .with_context(|| format!("cannot use control plane at {}", config.url))?;
    client
        .login()
        .await
        .with_context(|| format!("could not log in to {}", config.url))?;

    let token = client.session_token()?;
    info!(username = %username, "logged in");
    println!("{}", token.expose_secret());
    Ok(())
}

/// Invalidate the configured token.
pub async fn logout(config: &OctyneConfig) -> Result<()> {
    let Some(token) = &config.token else {
        bail!("logout needs a token (--token or OCTYNE_TOKEN)");
    };

    let client = Client::new(&config.url, Credentials::token(token))
        .with_context(|| format!("cannot use control plane at {}", config.url))?;
    client.logout().await.context("logout failed")?;

    println!("Logged out.");
    Ok(())
}
