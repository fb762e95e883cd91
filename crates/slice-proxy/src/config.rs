use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub origin: OriginConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_metrics_addr")]
    pub metrics_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Cache byte budget in megabytes (1 MB = 1_000_000 bytes).
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OriginConfig {
    /// Deadline for origin probes and fetches. Absent means requests
    /// block until the origin responds or errors.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Config {
            server: ServerConfig::default(),
            cache: CacheConfig::default(),
            origin: OriginConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            metrics_addr: default_metrics_addr(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size_mb: default_max_size_mb(),
        }
    }
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self { timeout_ms: None }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:8000".to_string()
}
fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}
fn default_max_size_mb() -> usize {
    64
}
