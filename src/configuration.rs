use std::str::FromStr;

use config::{Config, ConfigError, Environment, File, FileFormat};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::framebuffer::DEFAULT_DISPLAY_DEVICE;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DeviceConfig {
    pub path: String,
    pub autoprobe: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            path: String::from(DEFAULT_DISPLAY_DEVICE),
            autoprobe: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: String::from("info"),
        }
    }
}

impl LogConfig {
    /// The configured level, or `Info` if it doesn't name one.
    pub fn level_filter(&self) -> LevelFilter {
        LevelFilter::from_str(self.level.trim()).unwrap_or(LevelFilter::Info)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Configuration {
    pub device: DeviceConfig,
    pub log: LogConfig,
}

/// Config file read when `--config` is not given, if it exists.
pub const DEFAULT_CONFIG_FILE: &str = "./rawfb.yaml";

impl Configuration {
    /// Layers the built-in defaults, then a config file, then
    /// `RAWFB_`-prefixed environment variables.
    ///
    /// A named `config_file` must exist. Without one, [`DEFAULT_CONFIG_FILE`]
    /// is read if present.
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let defaults = serde_yaml::to_string(&Configuration::default())
            .map_err(|e| ConfigError::Foreign(Box::new(e)))?;

        let file = match config_file {
            Some(config_file) => File::with_name(config_file).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Config::builder()
            .add_source(File::from_str(defaults.as_str(), FileFormat::Yaml))
            .add_source(file)
            .add_source(
                Environment::with_prefix("rawfb")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }
}
