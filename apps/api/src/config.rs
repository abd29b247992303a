//! # API Configuration
//!
//! Configuration management for the cash API server.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     OCTO_BIND_ADDR=0.0.0.0:8080                                        │
//! │     OCTO_DIFFERENCE_TOLERANCE_CENTS=0                                  │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path> or OCTO_CONFIG                                     │
//! │     ~/.config/octotrack/octo.toml (Linux)                              │
//! │     ~/Library/Application Support/com.octotrack.cash/octo.toml (macOS) │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # octo.toml
//! [server]
//! bind_addr = "127.0.0.1"
//! port = 8080
//! cors_origins = ["http://localhost:5173"]
//!
//! [database]
//! path = "/var/lib/octotrack/cash.db"
//! max_connections = 5
//!
//! [register]
//! difference_tolerance_cents = 1
//! expiry_hours = 24
//! block_expired_movements = false
//!
//! [logging]
//! level = "info"
//! ```

use chrono::Duration;
use octo_core::{
    Money, RegisterPolicy, DEFAULT_DIFFERENCE_TOLERANCE_CENTS, DEFAULT_EXPIRY_HOURS,
};
use octo_db::DbConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Longest accepted expiry window (one year).
const MAX_EXPIRY_HOURS: i64 = 24 * 365;

// =============================================================================
// Errors
// =============================================================================

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by CORS. Empty allows none.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_bind_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://127.0.0.1:5173".to_string(),
    ]
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            bind_addr: default_bind_addr(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl ServerSettings {
    /// Returns the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    pub fn socket_addr(&self) -> ConfigResult<SocketAddr> {
        self.bind_address().parse().map_err(|_| {
            ConfigError::Invalid(format!("bad bind address: {}", self.bind_address()))
        })
    }
}

/// SQLite settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file. When unset, the platform data directory is used.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

/// Register rules that vary per deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterSettings {
    /// Largest |difference| accepted without a reason.
    #[serde(default = "default_tolerance")]
    pub difference_tolerance_cents: i64,

    /// Hours after opening before a register counts as expired.
    #[serde(default = "default_expiry_hours")]
    pub expiry_hours: i64,

    /// Reject movements on expired registers.
    #[serde(default)]
    pub block_expired_movements: bool,
}

fn default_tolerance() -> i64 {
    DEFAULT_DIFFERENCE_TOLERANCE_CENTS
}

fn default_expiry_hours() -> i64 {
    DEFAULT_EXPIRY_HOURS
}

impl Default for RegisterSettings {
    fn default() -> Self {
        RegisterSettings {
            difference_tolerance_cents: default_tolerance(),
            expiry_hours: default_expiry_hours(),
            block_expired_movements: false,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            level: default_log_level(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete API configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub register: RegisterSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl ApiConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (explicit path, `OCTO_CONFIG`, or the platform config dir)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        let path = config_path
            .or_else(|| std::env::var("OCTO_CONFIG").ok().map(PathBuf::from))
            .or_else(Self::default_config_path);

        if let Some(path) = path {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.server.socket_addr()?;

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.register.difference_tolerance_cents < 0 {
            return Err(ConfigError::Invalid(
                "register.difference_tolerance_cents cannot be negative".into(),
            ));
        }

        if !(1..=MAX_EXPIRY_HOURS).contains(&self.register.expiry_hours) {
            return Err(ConfigError::Invalid(format!(
                "register.expiry_hours must be between 1 and {}",
                MAX_EXPIRY_HOURS
            )));
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.level cannot be empty".into()));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `OCTO_*` overrides read through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Either "host" or "host:port"
        if let Some(addr) = lookup("OCTO_BIND_ADDR") {
            match addr.parse::<SocketAddr>() {
                Ok(socket) => {
                    self.server.bind_addr = socket.ip().to_string();
                    self.server.port = socket.port();
                }
                Err(_) => self.server.bind_addr = addr,
            }
            debug!(addr = %self.server.bind_address(), "Overriding bind address from environment");
        }

        if let Some(path) = lookup("OCTO_DATABASE_PATH") {
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(level) = lookup("OCTO_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(value) = lookup("OCTO_DIFFERENCE_TOLERANCE_CENTS") {
            match value.parse() {
                Ok(cents) => self.register.difference_tolerance_cents = cents,
                Err(_) => warn!(value = %value, "Ignoring invalid OCTO_DIFFERENCE_TOLERANCE_CENTS"),
            }
        }

        if let Some(value) = lookup("OCTO_EXPIRY_HOURS") {
            match value.parse() {
                Ok(hours) => self.register.expiry_hours = hours,
                Err(_) => warn!(value = %value, "Ignoring invalid OCTO_EXPIRY_HOURS"),
            }
        }

        if let Some(value) = lookup("OCTO_BLOCK_EXPIRED_MOVEMENTS") {
            match value.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.register.block_expired_movements = true,
                "0" | "false" | "no" => self.register.block_expired_movements = false,
                _ => warn!(value = %value, "Ignoring invalid OCTO_BLOCK_EXPIRED_MOVEMENTS"),
            }
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "octotrack", "cash")
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("octo.toml"))
    }

    // =========================================================================
    // Derived Settings
    // =========================================================================

    /// Database file: configured path, else the platform data dir.
    pub fn database_path(&self) -> PathBuf {
        if let Some(path) = &self.database.path {
            return path.clone();
        }
        Self::project_dirs()
            .map(|dirs| dirs.data_dir().join("cash.db"))
            .unwrap_or_else(|| PathBuf::from("octo_cash.db"))
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path()).max_connections(self.database.max_connections)
    }

    /// Register rules for the repositories.
    pub fn policy(&self) -> RegisterPolicy {
        RegisterPolicy {
            difference_tolerance: Money::from_cents(self.register.difference_tolerance_cents),
            expiry: Duration::hours(self.register.expiry_hours),
            block_expired_movements: self.register.block_expired_movements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.policy(), RegisterPolicy::default());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ApiConfig = toml::from_str(
            r#"
            [register]
            difference_tolerance_cents = 0
            block_expired_movements = true
            "#,
        )
        .unwrap();

        assert_eq!(config.register.difference_tolerance_cents, 0);
        assert!(config.register.block_expired_movements);
        assert_eq!(config.register.expiry_hours, 24);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ApiConfig::default();
        config.apply_overrides(lookup(&[
            ("OCTO_BIND_ADDR", "0.0.0.0:9000"),
            ("OCTO_DATABASE_PATH", "/tmp/cash.db"),
            ("OCTO_DIFFERENCE_TOLERANCE_CENTS", "5"),
            ("OCTO_EXPIRY_HOURS", "12"),
            ("OCTO_BLOCK_EXPIRED_MOVEMENTS", "true"),
        ]));

        assert_eq!(config.server.bind_address(), "0.0.0.0:9000");
        assert_eq!(config.database_path(), PathBuf::from("/tmp/cash.db"));

        let policy = config.policy();
        assert_eq!(policy.difference_tolerance, Money::from_cents(5));
        assert_eq!(policy.expiry, Duration::hours(12));
        assert!(policy.block_expired_movements);
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let mut config = ApiConfig::default();
        config.apply_overrides(lookup(&[
            ("OCTO_DIFFERENCE_TOLERANCE_CENTS", "one cent"),
            ("OCTO_BLOCK_EXPIRED_MOVEMENTS", "maybe"),
        ]));

        assert_eq!(config.register.difference_tolerance_cents, 1);
        assert!(!config.register.block_expired_movements);
    }

    #[test]
    fn test_bind_host_only() {
        let mut config = ApiConfig::default();
        config.apply_overrides(lookup(&[("OCTO_BIND_ADDR", "0.0.0.0")]));
        assert_eq!(config.server.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_config_validation() {
        let mut config = ApiConfig::default();

        config.register.difference_tolerance_cents = -1;
        assert!(config.validate().is_err());
        config.register.difference_tolerance_cents = 0;
        assert!(config.validate().is_ok());

        config.register.expiry_hours = 0;
        assert!(config.validate().is_err());
        config.register.expiry_hours = 24;

        config.database.max_connections = 0;
        assert!(config.validate().is_err());
        config.database.max_connections = 5;

        config.server.bind_addr = "not an address".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_serialization() {
        let config = ApiConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[register]"));
    }
}
