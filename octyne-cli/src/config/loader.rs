use super::types::{ConnectionArgs, DEFAULT_URL, OctyneConfig, RawOctyneConfig};
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the effective configuration: config file, then environment and flags
    pub fn load(args: &ConnectionArgs) -> Result<OctyneConfig> {
        let mut raw = RawOctyneConfig::default();

        // Layer 1: config file
        if let Some(path) = &args.config {
            if !path.exists() {
                bail!("config file {} does not exist", path.display());
            }
            raw = Self::merge_raw(raw, Self::read_raw(path)?);
        } else if let Some(path) = Self::user_config_path()
            && path.exists()
        {
            raw = Self::merge_raw(raw, Self::read_raw(&path)?);
        }

        // Layer 2: environment and flags (clap has already let flags win over env)
        raw = Self::merge_raw(raw, args.to_raw());

        Ok(Self::finalize(raw))
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "octyne").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// The file `load` reads from, if any
    pub fn config_path(args: &ConnectionArgs) -> Option<PathBuf> {
        args.config.clone().or_else(Self::user_config_path)
    }

    fn read_raw(path: &Path) -> Result<RawOctyneConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("invalid config in {}", path.display()))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawOctyneConfig, overlay: RawOctyneConfig) -> RawOctyneConfig {
        RawOctyneConfig {
            url: overlay.url.or(base.url),
            username: overlay.username.or(base.username),
            password: overlay.password.or(base.password),
            token: overlay.token.or(base.token),
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawOctyneConfig) -> OctyneConfig {
        OctyneConfig {
            url: raw.url.unwrap_or_else(|| DEFAULT_URL.to_string()),
            username: raw.username,
            password: raw.password,
            token: raw.token,
        }
    }
}
