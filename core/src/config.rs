//! Application settings: `config.yaml` in the config directory.
//!
//! Resolution order: built-in defaults, then the YAML file if present, then
//! environment overrides (`PDK_PARAMS_DIR`, `PDK_TELEMETRY`). A missing file
//! is fine; a malformed one is an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::watch::WatchConfig;


pub const CONFIG_DIR_ENV: &str = "PDK_CONFIG_DIR";
pub const PARAMS_DIR_ENV: &str = "PDK_PARAMS_DIR";
pub const TELEMETRY_ENV: &str = "PDK_TELEMETRY";
pub const CONFIG_FILE: &str = "config.yaml";


/// Settings loaded from `config.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Parameter directory. Relative paths are taken from the config dir.
    pub params_dir: PathBuf,
    /// UI refresh period in milliseconds.
    pub tick_ms: u64,
    pub watch_debounce_ms: u64,
    pub watch_channel_capacity: usize,
    /// Default log filter when `PDK_LOG` is unset.
    pub log_level: String,
    /// Optional JSON telemetry snapshot file.
    pub telemetry_path: Option<PathBuf>,
    /// Color theme name for the terminal UI.
    pub theme: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            params_dir: PathBuf::from("params"),
            tick_ms: 250,
            watch_debounce_ms: 50,
            watch_channel_capacity: 64,
            log_level: "info".into(),
            telemetry_path: None,
            theme: "dark".into(),
        }
    }
}

impl AppConfig {
    /// Load from `config_dir`, then apply process environment overrides.
    pub fn load(config_dir: &Path) -> Result<AppConfig, ConfigError> {
        Self::load_with(config_dir, |name| std::env::var(name).ok())
    }

    /// Like [`AppConfig::load`] with an explicit environment lookup.
    pub fn load_with(
        config_dir: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<AppConfig, ConfigError> {
        let path = config_dir.join(CONFIG_FILE);
        let mut config = match std::fs::read_to_string(&path) {
            Ok(text) => parse(&text).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no config at {}, using defaults", path.display());
                AppConfig::default()
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        if let Some(dir) = env(PARAMS_DIR_ENV) {
            config.params_dir = PathBuf::from(dir);
        }
        if let Some(file) = env(TELEMETRY_ENV) {
            config.telemetry_path = Some(PathBuf::from(file));
        }
        if config.params_dir.is_relative() {
            config.params_dir = config_dir.join(&config.params_dir);
        }
        Ok(config)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    pub fn watch_config(&self) -> WatchConfig {
        WatchConfig {
            debounce: Duration::from_millis(self.watch_debounce_ms),
            capacity: self.watch_channel_capacity.max(1),
        }
    }
}


/// Parse a config document. Unknown keys are ignored, missing keys default.
pub fn parse(content: &str) -> Result<AppConfig, serde_yaml::Error> {
    if content.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    serde_yaml::from_str(content)
}


/// Config directory: `PDK_CONFIG_DIR`, else `$HOME/.config/param-deck`.
pub fn resolve_config_dir() -> PathBuf {
    resolve_config_dir_with(|name| std::env::var(name).ok())
}

/// Like [`resolve_config_dir`] with an explicit environment lookup.
pub fn resolve_config_dir_with(env: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(dir) = env(CONFIG_DIR_ENV) {
        return PathBuf::from(dir);
    }
    let home = env("HOME").unwrap_or_else(|| "/tmp".into());
    PathBuf::from(home).join(".config").join("param-deck")
}


#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn missing_file_gives_defaults_under_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_with(dir.path(), no_env).unwrap();
        assert_eq!(config.params_dir, dir.path().join("params"));
        assert_eq!(config.tick_ms, 250);
        assert_eq!(config.watch_config().capacity, 64);
        assert_eq!(config.telemetry_path, None);
        assert_eq!(config.theme, "dark");
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "params_dir: /data/params/d\ntick_ms: 100\nlog_level: debug\n",
        )
        .unwrap();
        let config = AppConfig::load_with(dir.path(), no_env).unwrap();
        assert_eq!(config.params_dir, PathBuf::from("/data/params/d"));
        assert_eq!(config.tick(), Duration::from_millis(100));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.watch_debounce_ms, 50);
    }

    #[test]
    fn environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "params_dir: /from/file\n").unwrap();
        let env = |name: &str| match name {
            PARAMS_DIR_ENV => Some("/from/env".to_string()),
            TELEMETRY_ENV => Some("/run/telemetry.json".to_string()),
            _ => None,
        };
        let config = AppConfig::load_with(dir.path(), env).unwrap();
        assert_eq!(config.params_dir, PathBuf::from("/from/env"));
        assert_eq!(config.telemetry_path, Some(PathBuf::from("/run/telemetry.json")));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "tick_ms: [not a number").unwrap();
        let err = AppConfig::load_with(dir.path(), no_env).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(CONFIG_FILE));
    }

    #[test]
    fn empty_file_is_defaults() {
        assert_eq!(parse("  \n").unwrap(), AppConfig::default());
    }

    #[test]
    fn config_dir_prefers_override_then_home() {
        let dir = resolve_config_dir_with(|name| match name {
            CONFIG_DIR_ENV => Some("/tmp/test-pdk-config".into()),
            "HOME" => Some("/home/pilot".into()),
            _ => None,
        });
        assert_eq!(dir, PathBuf::from("/tmp/test-pdk-config"));

        let dir = resolve_config_dir_with(|name| (name == "HOME").then(|| "/home/pilot".into()));
        assert_eq!(dir, PathBuf::from("/home/pilot/.config/param-deck"));

        assert_eq!(
            resolve_config_dir_with(no_env),
            PathBuf::from("/tmp/.config/param-deck")
        );
    }
}
