use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use translator_core::POLL_INTERVAL;
use translator_engine::ClientSettings;

/// Settings read from `translator.ron`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server_url: String,
    pub poll_interval_ms: u64,
    pub request_timeout_secs: u64,
    pub max_poll_attempts: Option<u32>,
    pub log_to_file: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: ClientSettings::default().base_url,
            poll_interval_ms: POLL_INTERVAL.as_millis() as u64,
            request_timeout_secs: ClientSettings::default().request_timeout.as_secs(),
            max_poll_attempts: None,
            log_to_file: true,
        }
    }
}

impl AppConfig {
    pub fn poll_interval(&self) -> Duration {
        // A zero interval would spin the timer.
        Duration::from_millis(self.poll_interval_ms.max(100))
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.server_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
            ..ClientSettings::default()
        }
    }
}

/// Reads the config file. A missing file yields the defaults.
pub fn load(path: &Path) -> anyhow::Result<AppConfig> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(AppConfig::default()),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read config {}", path.display()))
        }
    };
    parse(&text).with_context(|| format!("failed to parse config {}", path.display()))
}

fn parse(text: &str) -> Result<AppConfig, ron::error::SpannedError> {
    ron::from_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = load(&temp.path().join("translator.ron")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.server_url, "http://127.0.0.1:8011");
        assert_eq!(config.poll_interval(), Duration::from_millis(2000));
        assert_eq!(config.max_poll_attempts, None);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = parse(
            r#"(
                server_url: "http://translate.internal:9000",
                max_poll_attempts: Some(30),
            )"#,
        )
        .unwrap();
        assert_eq!(config.server_url, "http://translate.internal:9000");
        assert_eq!(config.max_poll_attempts, Some(30));
        assert_eq!(config.poll_interval_ms, 2000);
        assert!(config.log_to_file);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("translator.ron");
        fs::write(&path, "(poll_interval_ms: \"fast\")").unwrap();
        let err = load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse config"));
    }

    #[test]
    fn client_settings_follow_config() {
        let config = AppConfig {
            request_timeout_secs: 5,
            ..AppConfig::default()
        };
        let settings = config.client_settings();
        assert_eq!(settings.request_timeout, Duration::from_secs(5));
        assert_eq!(settings.base_url, config.server_url);
    }
}
