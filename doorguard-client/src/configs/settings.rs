use std::env;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use doorguard_api::DeviceDescriptor;
use serde::{Deserialize, Serialize};

const DEFAULT_SETTINGS: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../",
    "configs/default.toml"
));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relay {
    pub host: String,
    /// Per request timeout; unset leaves the transport default
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monitor {
    pub host: String,
    pub port: u16,
    /// Delay between two polls of every watched device
    pub interval_ms: u64,
}

impl Default for Monitor {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            interval_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    pub relay: Relay,
    #[serde(default)]
    pub monitor: Monitor,
    pub devices: Vec<DeviceDescriptor>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        Self::defaults()
            .add_source(File::with_name(&format!("configs/{run_mode}")).required(false))
            .add_source(Environment::with_prefix("DOORGUARD").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Builder seeded with the compiled-in defaults.
    pub fn defaults() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(DEFAULT_SETTINGS, FileFormat::Toml))
    }
}
