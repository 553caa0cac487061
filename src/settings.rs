use std::{
    net::IpAddr,
    path::{Path, PathBuf},
};

use config::{Config, Environment, File};
use eyre::{eyre, Result, WrapErr};
use serde::Deserialize;

use crate::secrets::KubeConfig;

const ENV_PREFIX: &str = "NS1_WEBHOOK";

#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
    /// The API group the solver is served under. Taken from `GROUP_NAME`.
    #[serde(default)]
    pub group_name: String,
    #[serde(default)]
    pub kubernetes: KubeConfig,
    #[serde(default)]
    pub dns: DnsSettings,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DnsSettings {
    /// Recursive nameservers used to find zones. Empty means the system configuration.
    #[serde(default)]
    pub nameservers: Vec<IpAddr>,
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ns1-acme-webhook")
        .join("config.toml")
}

impl Settings {
    /// Load settings from `path` (optional, TOML), `NS1_WEBHOOK__*` variables and `GROUP_NAME`.
    pub fn load(path: &Path) -> Result<Settings> {
        Self::load_with_group(path, std::env::var("GROUP_NAME").ok())
    }

    fn load_with_group(path: &Path, group_name: Option<String>) -> Result<Settings> {
        let settings: Settings = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .set_override_option("group_name", group_name)?
            .build()
            .wrap_err_with(|| format!("Failed to read settings from {}", path.display()))?
            .try_deserialize()?;

        if settings.group_name.trim().is_empty() {
            return Err(eyre!("GROUP_NAME must be specified"));
        }

        Ok(settings)
    }
}
