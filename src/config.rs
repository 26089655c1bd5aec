use crate::model::projection::DEFAULT_PAGE_SIZE;
use crate::services::{DEFAULT_NAMESPACE, LAYOUT_FILE_NAME};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Input poll interval unless configured otherwise
pub const DEFAULT_TICK_RATE_MS: u64 = 100;
const MIN_TICK_RATE_MS: u64 = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Layout store file; `<config dir>/report_preferences.json` when unset
    pub layout_file: Option<String>,
    /// Slot inside the layout file
    pub namespace: String,
    pub page_size: usize,
    /// Where CSV exports go; the working directory when unset
    pub export_dir: Option<String>,
    /// How long the event loop waits for input before ticking
    pub tick_rate_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            layout_file: None,
            namespace: DEFAULT_NAMESPACE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            export_dir: None,
            tick_rate_ms: DEFAULT_TICK_RATE_MS,
        }
    }
}

impl Config {
    pub fn config_dir() -> Option<PathBuf> {
        let home = env::var("HOME").ok()?;
        Some(PathBuf::from(home).join(".sched-report"))
    }

    fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.json"))
    }

    pub fn load() -> Option<Config> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            return None;
        }

        let contents = fs::read_to_string(&config_path).ok()?;
        serde_json::from_str(&contents).ok()
    }

    /// Save the config to disk
    pub fn save(&self) -> anyhow::Result<()> {
        let config_dir = Self::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        let config_path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(&config_path, contents)?;

        Ok(())
    }

    /// Layout file to use, falling back to the config directory
    pub fn layout_path(&self) -> PathBuf {
        match &self.layout_file {
            Some(path) => PathBuf::from(path),
            None => Self::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(LAYOUT_FILE_NAME),
        }
    }

    /// Poll interval, never faster than about 60 frames a second
    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms.max(MIN_TICK_RATE_MS))
    }

    pub fn export_path(&self) -> PathBuf {
        self.export_dir
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"page_size": 50}"#).unwrap();
        assert_eq!(config.page_size, 50);
        assert_eq!(config.namespace, "report-sched");
        assert!(config.layout_file.is_none());
        assert_eq!(config.tick_rate(), Duration::from_millis(DEFAULT_TICK_RATE_MS));
    }

    #[test]
    fn test_tick_rate_has_a_floor() {
        let config: Config = serde_json::from_str(r#"{"tick_rate_ms": 250}"#).unwrap();
        assert_eq!(config.tick_rate(), Duration::from_millis(250));

        let config = Config {
            tick_rate_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.tick_rate(), Duration::from_millis(16));
    }

    #[test]
    fn test_explicit_paths() {
        let config = Config {
            layout_file: Some("/tmp/layout.json".to_string()),
            export_dir: Some("/tmp/exports".to_string()),
            ..Default::default()
        };
        assert_eq!(config.layout_path(), PathBuf::from("/tmp/layout.json"));
        assert_eq!(config.export_path(), PathBuf::from("/tmp/exports"));
        assert_eq!(Config::default().export_path(), PathBuf::from("."));
    }
}
