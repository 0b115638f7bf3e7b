use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "tripdata-fetch.toml";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DownloadConfig {
    /// Extra attempts after the first one fails transiently.
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_s: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-attempt timeout. Unset means no timeout.
    #[serde(default)]
    pub request_timeout_s: Option<u64>,
}

fn default_retries() -> u32 { 5 }
fn default_retry_delay() -> u64 { 5 }
fn default_user_agent() -> String { BROWSER_USER_AGENT.to_string() }

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            retry_delay_s: default_retry_delay(),
            user_agent: default_user_agent(),
            request_timeout_s: None,
        }
    }
}

impl DownloadConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_s)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_s.map(Duration::from_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PacingConfig {
    /// Pause after every month, skipped ones included.
    #[serde(default = "default_pause")]
    pub pause_s: u64,
}

fn default_pause() -> u64 { 2 }

impl Default for PacingConfig {
    fn default() -> Self {
        Self { pause_s: default_pause() }
    }
}

impl PacingConfig {
    pub fn pause(&self) -> Duration {
        Duration::from_secs(self.pause_s)
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse config TOML")
    }

    /// Like `load`, but a missing file means defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_parses() {
        let config = Config::load(Path::new("tripdata-fetch.toml")).unwrap();
        assert_eq!(config.download.retries, 5);
        assert_eq!(config.download.retry_delay_s, 5);
        assert_eq!(config.download.user_agent, "Mozilla/5.0");
        assert_eq!(config.pacing.pause_s, 2);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.download.retries, 5);
        assert_eq!(config.download.retry_delay(), Duration::from_secs(5));
        assert!(config.download.request_timeout().is_none());
        assert_eq!(config.pacing.pause(), Duration::from_secs(2));
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = Config::parse("[download]\nretries = 1\nrequest_timeout_s = 30\n").unwrap();
        assert_eq!(config.download.retries, 1);
        assert_eq!(config.download.retry_delay_s, 5);
        assert_eq!(config.download.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.pacing.pause_s, 2);
    }

    #[test]
    fn test_malformed_config_errors() {
        assert!(Config::parse("[download]\nretries = \"many\"\n").is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Config::load_or_default(Path::new("does-not-exist.toml")).unwrap();
        assert_eq!(config.download.retries, 5);
    }
}
