mod types;

pub use types::*;

use crate::Result;
use std::{env, path::Path};
use tracing::debug;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const BASE_URL_ENV: &str = "GEMINI_BASE_URL";

pub async fn load() -> Result<Config> {
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
    let mut config = load_from(&config_path).await?;
    apply_env_overrides(&mut config, |name| env::var(name).ok());
    Ok(config)
}

/// Reads a YAML config file. A missing file yields the defaults.
pub async fn load_from(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();

    if !tokio::fs::try_exists(path).await? {
        debug!("No configuration file at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    debug!("Loading configuration from: {}", path.display());

    let config_str = tokio::fs::read_to_string(path).await?;
    let config: Config = serde_yaml::from_str(&config_str)?;

    Ok(config)
}

/// Environment values win over the file so the credential never has to be
/// written to disk.
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
        config.gemini.api_key = Some(key);
    }
    if let Some(url) = lookup(BASE_URL_ENV).filter(|u| !u.trim().is_empty()) {
        config.gemini.base_url = url;
    }
}
