//! Server configuration

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use todos_core::{CategoryPolicy, DEFAULT_CATEGORIES};

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address
    pub addr: SocketAddr,
    /// Data directory for store files
    pub data_dir: String,
    /// Todo pipeline configuration
    pub todos: TodosConfig,
}

/// Todo pipeline configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TodosConfig {
    /// Known category labels
    pub categories: Vec<String>,
    /// Where category membership is enforced
    pub category_policy: CategoryPolicy,
    /// Upper bound for one persistence round trip, in milliseconds
    pub insert_timeout_ms: u64,
    /// Maximum size of the LMDB memory map in bytes
    pub map_size: usize,
}

impl Default for TodosConfig {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            category_policy: CategoryPolicy::default(),
            insert_timeout_ms: 5000,
            map_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl TodosConfig {
    /// Insert timeout as a [`Duration`]
    pub fn insert_timeout(&self) -> Duration {
        Duration::from_millis(self.insert_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8474".parse().unwrap(),
            data_dir: "./data".to_string(),
            todos: TodosConfig::default(),
        }
    }
}

/// Configuration file structure (`todos.toml`)
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    addr: Option<SocketAddr>,
    data_dir: Option<String>,
    #[serde(default)]
    todos: TodosConfig,
}

impl Config {
    /// Load configuration from `config_dir/todos.toml`
    /// Returns None if the file doesn't exist or can't be parsed
    fn from_file(config_dir: impl AsRef<Path>) -> Option<ConfigFile> {
        let config_path = config_dir.as_ref().join("todos.toml");

        if !config_path.exists() {
            tracing::debug!("Config file not found: {:?}", config_path);
            return None;
        }

        match std::fs::read_to_string(&config_path) {
            Ok(content) => match toml::from_str::<ConfigFile>(&content) {
                Ok(config) => {
                    tracing::info!("Loaded configuration from {:?}", config_path);
                    Some(config)
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config file {:?}: {}", config_path, e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config file {:?}: {}", config_path, e);
                None
            }
        }
    }

    /// Load configuration from environment variables and config file
    /// Priority: Environment variables > config file > defaults
    pub fn load(config_dir: impl AsRef<Path>) -> Self {
        let defaults = Config::default();

        // Config file first (will be overridden by env vars)
        let file = Self::from_file(config_dir).unwrap_or_default();

        let mut config = Self {
            addr: file.addr.unwrap_or(defaults.addr),
            data_dir: file.data_dir.unwrap_or(defaults.data_dir),
            todos: file.todos,
        };

        if let Ok(addr) = std::env::var("TODOS_ADDR") {
            match addr.parse() {
                Ok(addr) => config.addr = addr,
                Err(_) => tracing::warn!("Ignoring invalid TODOS_ADDR: {}", addr),
            }
        }

        if let Ok(data_dir) = std::env::var("TODOS_DATA_DIR") {
            config.data_dir = data_dir;
        }

        if let Ok(policy) = std::env::var("TODOS_CATEGORY_POLICY") {
            match policy.parse() {
                Ok(policy) => config.todos.category_policy = policy,
                Err(_) => tracing::warn!("Ignoring invalid TODOS_CATEGORY_POLICY: {}", policy),
            }
        }

        if let Ok(timeout) = std::env::var("TODOS_INSERT_TIMEOUT_MS") {
            config.todos.insert_timeout_ms = timeout
                .parse::<u64>()
                .unwrap_or(config.todos.insert_timeout_ms);
        }

        config
    }

    /// Set a new data directory
    pub fn with_data_dir(mut self, data_dir: impl Into<String>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Set a new bind address
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }
}
