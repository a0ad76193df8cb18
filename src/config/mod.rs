//! Configuration management.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Crawl behavior
    #[serde(default)]
    pub crawl: CrawlConfig,

    /// Local record store
    #[serde(default)]
    pub store: StoreConfig,
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// User agent sent to arXiv
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Crawl behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Maximum concurrent per-node fetches within one BFS layer
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Budget for one node's metadata + source fetch, in seconds.
    /// A timeout is an ordinary fetch failure, not a crawl failure.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

fn default_max_concurrent() -> usize {
    4
}

fn default_fetch_timeout_secs() -> u64 {
    120
}

/// Local record store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Whether fetched records are cached through the store
    #[serde(default)]
    pub enabled: bool,

    /// Store directory; defaults to the platform data dir
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl StoreConfig {
    /// Configured directory, falling back to the platform data dir.
    pub fn resolved_directory(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(default_store_dir)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: None,
        }
    }
}

/// Default store directory under the platform data dir.
pub fn default_store_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("arxiv-citegraph")
}

/// Load configuration from a file, with `CITEGRAPH_`-prefixed environment
/// variables layered on top.
pub fn load_config(path: &PathBuf) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path.as_path()))
        .add_source(config::Environment::with_prefix("CITEGRAPH").separator("__"))
        .build()?;

    settings.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.crawl.max_concurrent, 4);
        assert!(!config.store.enabled);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: Config = toml::from_str("[crawl]\nmax_concurrent = 8\n").unwrap();
        assert_eq!(config.crawl.max_concurrent, 8);
        assert_eq!(config.crawl.fetch_timeout_secs, 120);
        assert_eq!(config.http.timeout_secs, 30);
    }
}
