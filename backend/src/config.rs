//! Configuration management for the Kitchen Stock service
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with KS_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Which entity store backs the service
    pub store: StoreConfig,

    /// Stock ledger write behavior
    pub inventory: InventoryConfig,

    /// Supplier notification channel
    pub notification: NotificationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    #[serde(default)]
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InventoryConfig {
    /// Attempts per journal row before a write conflict counts as a failure
    pub max_write_attempts: u32,

    /// Base backoff between attempts; multiplied by the attempt number
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationMode {
    Log,
    Webhook,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationConfig {
    pub mode: NotificationMode,

    /// Required when mode is `webhook`
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Shown as the sender in supplier messages
    pub sender_name: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("KS_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.url", "")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("store.backend", "postgres")?
            .set_default("inventory.max_write_attempts", 5)?
            .set_default("inventory.retry_backoff_ms", 25)?
            .set_default("notification.mode", "log")?
            .set_default("notification.sender_name", "Kitchen Stock")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (KS_ prefix)
            .add_source(
                Environment::with_prefix("KS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.store.backend == StoreBackend::Postgres && self.database.url.is_empty() {
            return Err(ConfigError::Message(
                "database.url is required for the postgres store".to_string(),
            ));
        }
        if self.notification.mode == NotificationMode::Webhook
            && self.notification.webhook_url.as_deref().map_or(true, str::is_empty)
        {
            return Err(ConfigError::Message(
                "notification.webhook_url is required for webhook mode".to_string(),
            ));
        }
        if self.inventory.max_write_attempts == 0 {
            return Err(ConfigError::Message(
                "inventory.max_write_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// In-memory configuration used by tests and the demo binary mode
    pub fn in_memory() -> Self {
        Self {
            environment: "test".to_string(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            store: StoreConfig {
                backend: StoreBackend::Memory,
            },
            inventory: InventoryConfig::default(),
            notification: NotificationConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 2,
        }
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            max_write_attempts: 5,
            retry_backoff_ms: 25,
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            mode: NotificationMode::Log,
            webhook_url: None,
            sender_name: "Kitchen Stock".to_string(),
        }
    }
}
