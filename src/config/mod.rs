use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Backend base URL; endpoint paths such as `/admin/agents` are appended to it
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_base_url() -> String {
    "http://localhost:5000/api/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding `cookies.json` and `local_storage.json`
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Lifetime of the cookie backing entries in days (default: 7)
    #[serde(default = "default_cookie_ttl_days")]
    pub cookie_ttl_days: i64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            cookie_ttl_days: default_cookie_ttl_days(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./.paywallet")
}

fn default_cookie_ttl_days() -> i64 {
    7
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Seconds an unsubscribed entry is kept before eviction (default: 60)
    #[serde(default = "default_idle_window_secs")]
    pub idle_window_secs: u64,
    /// Interval between eviction sweeps in seconds (default: 30)
    #[serde(default = "default_eviction_interval_secs")]
    pub eviction_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            idle_window_secs: default_idle_window_secs(),
            eviction_interval_secs: default_eviction_interval_secs(),
        }
    }
}

impl CacheConfig {
    pub fn idle_window(&self) -> Duration {
        Duration::from_secs(self.idle_window_secs)
    }
}

fn default_idle_window_secs() -> u64 {
    60
}

fn default_eviction_interval_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse(&content)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse configuration file")
    }

    pub fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            storage: StorageConfig::default(),
            cache: CacheConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
