use crate::analytics::AnalyticsConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Where the analytics profile is kept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Discarded when the process exits
    Memory,
    /// JSON file on disk
    File { path: String },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::File {
            path: "./data/analytics.json".to_string(),
        }
    }
}

impl AppConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.analytics.session_timeout_secs <= 0 {
            return Err("analytics.session_timeout_secs must be positive".to_string());
        }

        if self.analytics.project_view_event.trim().is_empty() {
            return Err("analytics.project_view_event must not be empty".to_string());
        }

        if let StorageConfig::File { path } = &self.storage
            && path.trim().is_empty()
        {
            return Err("storage.path must not be empty for file storage".to_string());
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Load configuration from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, String> {
    let path = path.as_ref();
    info!("Loading configuration from: {}", path.display());

    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

    let config: AppConfig = serde_yaml::from_str(&contents)
        .map_err(|e| format!("Failed to parse YAML config: {}", e))?;

    config.validate()?;

    info!(
        "Configuration loaded: session timeout {}s, storage {:?}",
        config.analytics.session_timeout_secs, config.storage
    );

    Ok(config)
}

/// Load configuration with fallback options
pub fn load_config_with_fallback() -> Result<AppConfig, String> {
    if let Ok(config_path) = std::env::var("CONFIG_PATH") {
        match load_config(&config_path) {
            Ok(config) => return Ok(config),
            Err(e) => warn!(
                "Failed to load config from CONFIG_PATH ({}): {}",
                config_path, e
            ),
        }
    }

    for path in ["config.yaml", "config.yml"] {
        if Path::new(path).exists() {
            match load_config(path) {
                Ok(config) => return Ok(config),
                Err(e) => warn!("Failed to load config from '{}': {}", path, e),
            }
        }
    }

    Err("No configuration file found. Create config.yaml or set CONFIG_PATH.".to_string())
}
