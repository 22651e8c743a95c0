use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context};
use serde::Deserialize;
use url::Url;

const LOCAL_CONFIG_FILE: &str = "staffdesk.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub notification_ttl_ms: u64,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".into(),
            notification_ttl_ms: 3500,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }

    /// Parsed base URL; also the origin attachment refs are resolved against.
    pub fn api_base(&self) -> anyhow::Result<Url> {
        parse_api_base_url(&self.api_base_url)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    api_base_url: Option<String>,
    notification_ttl_ms: Option<u64>,
    log_filter: Option<String>,
}

pub fn load_settings(explicit: Option<&Path>) -> anyhow::Result<Settings> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config_file(),
    };
    load_settings_from(path.as_deref(), |key| std::env::var(key).ok())
}

/// Defaults, then the TOML file at `path`, then variables returned by `env`.
pub fn load_settings_from(
    path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Some(path) = path {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let file_cfg: FileSettings = toml::from_str(&raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?;
        if let Some(v) = file_cfg.api_base_url {
            settings.api_base_url = v;
        }
        if let Some(v) = file_cfg.notification_ttl_ms {
            settings.notification_ttl_ms = v;
        }
        if let Some(v) = file_cfg.log_filter {
            settings.log_filter = v;
        }
    }

    if let Some(v) = env("STAFFDESK_API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = env("APP__NOTIFICATION_TTL_MS") {
        settings.notification_ttl_ms = v
            .trim()
            .parse()
            .with_context(|| format!("APP__NOTIFICATION_TTL_MS is not a number: '{v}'"))?;
    }

    if let Some(v) = env("APP__LOG_FILTER") {
        settings.log_filter = v;
    }

    Ok(settings)
}

fn discover_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join("staffdesk").join("config.toml"))
        .filter(|path| path.is_file())
}

pub fn parse_api_base_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid API base URL '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("API base URL must use http or https, got '{}'", url.scheme());
    }
    Ok(url)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
