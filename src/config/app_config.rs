use std::{path::PathBuf, time::Duration};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use super::{
    correlator::CorrelatorConfig,
    helpers::deserialize_duration_from_seconds,
    http_retry::BaseHttpClientConfig,
    outbound::{EnrichmentConfig, SinkConfig, SummarizerConfig},
    server::ServerConfig,
};

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("backups")
}

/// Where received backup artifacts are stored.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory for stored backups; one subdirectory per client.
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { backup_dir: default_backup_dir() }
    }
}

/// Application configuration for Vigil.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Alert intake server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Spike correlator tuning.
    #[serde(default)]
    pub correlator: CorrelatorConfig,

    /// Reputation provider; absent means alerts forward unenriched.
    #[serde(default)]
    pub enrichment: Option<EnrichmentConfig>,

    /// Spike summary generator; absent means raw aggregates only.
    #[serde(default)]
    pub summarizer: Option<SummarizerConfig>,

    /// The notification sink deliveries go to.
    pub sink: SinkConfig,

    /// Backup artifact storage.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Settings for the base outbound HTTP client.
    #[serde(default)]
    pub http_base: BaseHttpClientConfig,

    /// The maximum time in seconds to wait for graceful shutdown.
    #[serde(
        default = "default_shutdown_timeout",
        deserialize_with = "deserialize_duration_from_seconds"
    )]
    pub shutdown_timeout: Duration,
}

impl AppConfig {
    /// Creates a new `AppConfig` by reading `app.yaml` from the configuration
    /// directory, with `VIGIL__`-prefixed environment variables layered on
    /// top.
    pub fn new(config_dir: Option<&str>) -> Result<Self, ConfigError> {
        let config_dir = config_dir.unwrap_or("configs");
        let s = Config::builder()
            .add_source(File::with_name(&format!("{config_dir}/app.yaml")))
            .add_source(Environment::with_prefix("VIGIL").separator("__"))
            .build()?;
        s.try_deserialize()
    }
}
