use profile::config::{ProfileConfig, ValidationError as ProfileValidationError};
use riot_client::config::{RiotConfig, ValidationError as RiotValidationError};
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

pub const API_KEY_ENV: &str = "RIOT_API_KEY";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    ValidationError(#[from] ValidationError),
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error(transparent)]
    Riot(#[from] RiotValidationError),

    #[error(transparent)]
    Profile(#[from] ProfileValidationError),
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    pub host: String,
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
    #[serde(default = "default_metrics_prefix")]
    pub prefix: String,
}

fn default_metrics_prefix() -> String {
    "summoner_api".to_string()
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    pub sentry_dsn: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            sentry_dsn: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    pub listener: Listener,
    pub admin_listener: Listener,
    pub riot: RiotConfig,
    #[serde(default)]
    pub profile: ProfileConfig,
    #[serde(default)]
    pub metrics: Option<MetricsConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Loads and validates the YAML config at `path`. A non-empty
    /// `RIOT_API_KEY` replaces the key from the file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let mut config: Config = serde_yaml::from_reader(file)?;
        config.override_api_key(std::env::var(API_KEY_ENV).ok());
        config.validate()?;

        Ok(config)
    }

    pub fn override_api_key(&mut self, api_key: Option<String>) {
        if let Some(api_key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.riot.api_key = api_key;
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;
        self.riot.validate()?;
        self.profile.validate()?;
        Ok(())
    }
}
