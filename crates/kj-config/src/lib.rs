//! # kj-config
//!
//! Layered runtime configuration. Later layers win:
//! 1. built-in defaults
//! 2. `kkojil.toml` (or the file named by `KKOJIL_CONFIG`), if present
//! 3. `KKOJIL__SECTION__KEY` environment variables (a `.env` file is read first)

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "kkojil.toml";
pub const CONFIG_FILE_ENV: &str = "KKOJIL_CONFIG";
const ENV_PREFIX: &str = "KKOJIL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub generator: GeneratorConfig,
    pub log: LogConfig,
    /// Write the starter questions into an empty store at startup.
    pub seed_defaults: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_max_age_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Only read by the `file` backend.
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    File,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl GeneratorConfig {
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub format: LogFormat,
    /// `EnvFilter` directives, used when `RUST_LOG` is unset.
    pub filter: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

impl AppConfig {
    /// Loads `.env`, the config file and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let file = std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.into());
        debug!(file = %file, "loading configuration");
        Self::load_from(Some(&file), &[])
    }

    /// Like [`AppConfig::load`] without `.env`, with an explicit file and
    /// overrides applied last.
    pub fn load_from(file: Option<&str>, overrides: &[(&str, &str)]) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.cors_max_age_secs", 3600)?
            .set_default("storage.backend", "file")?
            .set_default("storage.path", "./data/kkojil.json")?
            .set_default("generator.min_delay_ms", 800)?
            .set_default("generator.max_delay_ms", 1000)?
            .set_default("log.format", "pretty")?
            .set_default("log.filter", "kkojil=info,kj_api=info,kj_core=info,tower_http=info")?
            .set_default("seed_defaults", true)?;

        if let Some(file) = file {
            builder = builder.add_source(File::with_name(file).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        Ok(builder.build()?.try_deserialize()?)
    }
}
