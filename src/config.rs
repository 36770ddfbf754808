//! CLI settings file

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::api::ClientConfig;
use crate::paths;

/// How commands print results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human readable lines
    #[default]
    Text,
    /// Pretty JSON
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Json => "json",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format: {other} (expected text or json)")),
        }
    }
}

/// Settings read from `config.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Account used when `--account` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_account: Option<String>,

    /// Output format
    #[serde(default)]
    pub output: OutputFormat,

    /// Verbose logging
    #[serde(default)]
    pub debug: bool,

    /// Seconds between container status polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Seconds before container polling gives up
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// API host override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_poll_interval() -> u64 {
    2
}

fn default_poll_timeout() -> u64 {
    300
}

fn default_http_timeout() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_account: None,
            output: OutputFormat::default(),
            debug: false,
            poll_interval_secs: default_poll_interval(),
            poll_timeout_secs: default_poll_timeout(),
            http_timeout_secs: default_http_timeout(),
            base_url: None,
        }
    }
}

/// Keys accepted by `get`, `set` and `unset`
pub const KEYS: [&str; 7] = [
    "default_account",
    "output",
    "debug",
    "poll_interval_secs",
    "poll_timeout_secs",
    "http_timeout_secs",
    "base_url",
];

fn parse_secs(key: &str, value: &str) -> Result<u64> {
    let secs: u64 = value
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a whole number of seconds"))?;
    if secs == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(secs)
}

impl Config {
    /// `config.toml` in the data directory
    pub fn default_path() -> Result<PathBuf> {
        paths::config_path()
    }

    /// Load from the default path, or defaults when missing
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from `path`, or defaults when missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path()?)
    }

    /// Save to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Current value of `key` (`None` when unset)
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = match key {
            "default_account" => self.default_account.clone(),
            "output" => Some(self.output.to_string()),
            "debug" => Some(self.debug.to_string()),
            "poll_interval_secs" => Some(self.poll_interval_secs.to_string()),
            "poll_timeout_secs" => Some(self.poll_timeout_secs.to_string()),
            "http_timeout_secs" => Some(self.http_timeout_secs.to_string()),
            "base_url" => self.base_url.clone(),
            other => bail!("Unknown config key: {other} (valid keys: {})", KEYS.join(", ")),
        };
        Ok(value)
    }

    /// Parse and store `value` under `key`
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "default_account" => {
                let name = crate::auth::normalize_account(value);
                if name.is_empty() {
                    bail!("default_account must not be empty");
                }
                self.default_account = Some(name);
            }
            "output" => self.output = value.parse().map_err(anyhow::Error::msg)?,
            "debug" => {
                self.debug = value
                    .trim()
                    .parse()
                    .context("debug must be true or false")?;
            }
            "poll_interval_secs" => self.poll_interval_secs = parse_secs(key, value)?,
            "poll_timeout_secs" => self.poll_timeout_secs = parse_secs(key, value)?,
            "http_timeout_secs" => self.http_timeout_secs = parse_secs(key, value)?,
            "base_url" => {
                let url = value.trim();
                reqwest::Url::parse(url).with_context(|| format!("Invalid base_url: {url}"))?;
                self.base_url = Some(url.trim_end_matches('/').to_string());
            }
            other => bail!("Unknown config key: {other} (valid keys: {})", KEYS.join(", ")),
        }
        Ok(())
    }

    /// Reset `key` to its default
    pub fn unset(&mut self, key: &str) -> Result<()> {
        let defaults = Self::default();
        match key {
            "default_account" => self.default_account = None,
            "output" => self.output = defaults.output,
            "debug" => self.debug = defaults.debug,
            "poll_interval_secs" => self.poll_interval_secs = defaults.poll_interval_secs,
            "poll_timeout_secs" => self.poll_timeout_secs = defaults.poll_timeout_secs,
            "http_timeout_secs" => self.http_timeout_secs = defaults.http_timeout_secs,
            "base_url" => self.base_url = None,
            other => bail!("Unknown config key: {other} (valid keys: {})", KEYS.join(", ")),
        }
        Ok(())
    }

    /// Every key with its current value
    pub fn list(&self) -> Vec<(&'static str, Option<String>)> {
        KEYS.iter()
            .map(|key| (*key, self.get(key).ok().flatten()))
            .collect()
    }

    /// Copy the client-relevant settings into `config`
    pub fn apply_to(&self, config: &mut ClientConfig) {
        config.http_timeout = Duration::from_secs(self.http_timeout_secs);
        config.poll.interval = Duration::from_secs(self.poll_interval_secs);
        config.poll.timeout = Duration::from_secs(self.poll_timeout_secs);
        if let Some(base_url) = &self.base_url {
            config.base_url.clone_from(base_url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.output, OutputFormat::Text);
        assert_eq!(config.poll_interval_secs, 2);
        assert_eq!(config.poll_timeout_secs, 300);
        assert_eq!(config.http_timeout_secs, 30);
        assert!(config.default_account.is_none());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("output = \"json\"\n").unwrap();
        assert_eq!(config.output, OutputFormat::Json);
        assert_eq!(config.poll_timeout_secs, 300);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.set("default_account", " Work ").unwrap();
        config.set("poll_timeout_secs", "60").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.default_account.as_deref(), Some("work"));
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.set("output", "xml").is_err());
        assert!(config.set("debug", "maybe").is_err());
        assert!(config.set("poll_interval_secs", "0").is_err());
        assert!(config.set("base_url", "not a url").is_err());
        assert!(config.set("nope", "1").is_err());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_get_unset_list() {
        let mut config = Config::default();
        config.set("base_url", "http://localhost:8080/").unwrap();
        assert_eq!(
            config.get("base_url").unwrap().as_deref(),
            Some("http://localhost:8080")
        );

        config.unset("base_url").unwrap();
        assert_eq!(config.get("base_url").unwrap(), None);
        assert!(config.get("bogus").is_err());

        let listed = config.list();
        assert_eq!(listed.len(), KEYS.len());
        assert_eq!(listed[1], ("output", Some("text".to_string())));
    }

    #[test]
    fn test_apply_to_client_config() {
        let mut config = Config::default();
        config.set("poll_interval_secs", "5").unwrap();
        config.set("base_url", "http://localhost:9000").unwrap();

        let mut client = ClientConfig::default();
        config.apply_to(&mut client);
        assert_eq!(client.poll.interval, Duration::from_secs(5));
        assert_eq!(client.base_url, "http://localhost:9000");
    }
}
