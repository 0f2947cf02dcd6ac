use std::{env, fmt, fs, path, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::monitoring::EngineSettings;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read config file")]
    ReadFailed(#[source] std::io::Error),
    #[error("failed to write config file")]
    WriteFailed(#[source] std::io::Error),
    #[error("failed to parse config file")]
    ParseFailed(#[source] toml::de::Error),
    #[error("failed to serialize config")]
    SerializeFailed(#[source] toml::ser::Error),
    #[error("no usable config directory (set XDG_CONFIG_HOME or HOME)")]
    ConfigPathUnavailable,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseSection,
    pub monitoring: MonitoringSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MonitoringSection {
    pub reconcile_interval_seconds: u64,
    pub probe_timeout_seconds: u64,
    pub fallback_interval_seconds: u64,
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/pulse/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, Error> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(Error::ConfigPathUnavailable);
    };

    Ok(path.join("pulse/config.toml"))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseSection { path: "pulse.db".into() },
            monitoring: MonitoringSection {
                reconcile_interval_seconds: 5,
                probe_timeout_seconds: 10,
                fallback_interval_seconds: 60,
            },
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Current Internal Configuration State:")?;
        write_title_1(f, "Database")?;
        write_1(f, "Path", &self.database.path)?;
        write_title_1(f, "Monitoring")?;
        write_1(f, "Reconcile Interval (s)", &self.monitoring.reconcile_interval_seconds)?;
        write_1(f, "Probe Timeout (s)", &self.monitoring.probe_timeout_seconds)?;
        write_1(f, "Fallback Interval (s)", &self.monitoring.fallback_interval_seconds)?;

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/pulse/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, Error> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path).map_err(Error::ReadFailed)?;
            toml::from_str(raw_string.as_str()).map_err(Error::ParseFailed)
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            Ok(config)
        }
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &std::path::Path) -> Result<(), Error> {
        let config_str: String = toml::to_string_pretty(self).map_err(Error::SerializeFailed)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(Error::WriteFailed)?;
        }

        std::fs::write(path, config_str).map_err(Error::WriteFailed)
    }

    /// Engine tunables derived from the monitoring section
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            reconcile_interval: Duration::from_secs(self.monitoring.reconcile_interval_seconds),
            probe_timeout: Duration::from_secs(self.monitoring.probe_timeout_seconds),
            fallback_interval: Duration::from_secs(self.monitoring.fallback_interval_seconds),
        }
    }
}
