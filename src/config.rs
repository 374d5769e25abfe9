//! Configuration management

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_metrics_url")]
    pub metrics_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Period of the recurring `time` metric while playing
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_secs: u64,
    /// Page size used when listing a channel's broadcasts
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    // Host application identity, reported with the setup metric
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_unknown")]
    pub app_version: String,
    #[serde(default = "default_unknown")]
    pub app_build: String,
    #[serde(default)]
    pub bundle_identifier: String,
    #[serde(default)]
    pub os_version: String,
}

fn default_api_url() -> String { "https://api.boxcast.com".to_string() }
fn default_metrics_url() -> String { "https://metrics.boxcast.com".to_string() }
fn default_request_timeout() -> u64 { 30 }
fn default_metrics_interval() -> u64 { 60 }
fn default_page_limit() -> u32 { 100 }
fn default_app_name() -> String { env!("CARGO_PKG_NAME").to_string() }
fn default_unknown() -> String { "Unknown".to_string() }

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            metrics_url: default_metrics_url(),
            request_timeout_secs: default_request_timeout(),
            metrics_interval_secs: default_metrics_interval(),
            page_limit: default_page_limit(),
            app_name: default_app_name(),
            app_version: default_unknown(),
            app_build: default_unknown(),
            bundle_identifier: String::new(),
            os_version: String::new(),
        }
    }
}

impl ClientConfig {
    pub fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("boxcast");
        path.push("config.json");
        path
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Never shorter than one second.
    pub fn metrics_interval(&self) -> Duration {
        Duration::from_secs(self.metrics_interval_secs.max(1))
    }

    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Read a config file, falling back to defaults when it is missing or invalid.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "invalid config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable config, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self) -> std::io::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"api_url":"https://staging.example.com","metrics_interval_secs":5}"#)
                .unwrap();
        assert_eq!(config.api_url, "https://staging.example.com");
        assert_eq!(config.metrics_interval(), Duration::from_secs(5));
        assert_eq!(config.metrics_url, "https://metrics.boxcast.com");
        assert_eq!(config.page_limit, 100);
        assert_eq!(config.app_version, "Unknown");
    }

    #[test]
    fn test_zero_metrics_interval_is_clamped() {
        let config: ClientConfig = serde_json::from_str(r#"{"metrics_interval_secs":0}"#).unwrap();
        assert_eq!(config.metrics_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = ClientConfig {
            app_name: "Chapel".to_string(),
            request_timeout_secs: 5,
            ..ClientConfig::default()
        };
        config.save_to(&path).unwrap();

        assert_eq!(ClientConfig::load_from(&path), config);
    }

    #[test]
    fn test_invalid_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();

        assert_eq!(ClientConfig::load_from(&path), ClientConfig::default());
        assert_eq!(
            ClientConfig::load_from(&dir.path().join("missing.json")),
            ClientConfig::default()
        );
    }
}
