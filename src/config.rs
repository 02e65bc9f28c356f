//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub influxdb: InfluxDbConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// InfluxDB connection and cache settings
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct InfluxDbConfig {
    #[serde(default = "default_url")]
    pub url: String,

    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    #[serde(default = "default_time_zone")]
    pub time_zone: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_measurements_ttl")]
    pub measurements_ttl_secs: u64,

    #[serde(default = "default_measurement_info_ttl")]
    pub measurement_info_ttl_secs: u64,
}

fn default_url() -> String {
    "http://localhost:8086".to_string()
}

fn default_database() -> String {
    "telemetry".to_string()
}

fn default_time_zone() -> String {
    "Asia/Shanghai".to_string()
}

fn default_request_timeout() -> u64 {
    30_000 // 30 seconds
}

fn default_measurements_ttl() -> u64 {
    3600 // 1 hour
}

fn default_measurement_info_ttl() -> u64 {
    600 // 10 minutes
}

impl Default for InfluxDbConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            database: default_database(),
            username: String::new(),
            password: String::new(),
            time_zone: default_time_zone(),
            request_timeout_ms: default_request_timeout(),
            measurements_ttl_secs: default_measurements_ttl(),
            measurement_info_ttl_secs: default_measurement_info_ttl(),
        }
    }
}

impl fmt::Display for InfluxDbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} db={} tz={}", self.url, self.database, self.time_zone)?;
        if !self.username.is_empty() {
            write!(f, " user={}", self.username)?;
        }
        Ok(())
    }
}

impl fmt::Debug for InfluxDbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let password = if self.password.is_empty() { "" } else { "***" };
        f.debug_struct("InfluxDbConfig")
            .field("url", &self.url)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &password)
            .field("time_zone", &self.time_zone)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("measurements_ttl_secs", &self.measurements_ttl_secs)
            .field("measurement_info_ttl_secs", &self.measurement_info_ttl_secs)
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("influx-series").join("config.toml")),
            Some(PathBuf::from("/etc/influx-series/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        // Fall back to environment-only config
        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // InfluxDB overrides
        if let Some(url) = var("INFLUX_URL") {
            self.influxdb.url = url;
        }
        if let Some(database) = var("INFLUX_DATABASE") {
            self.influxdb.database = database;
        }
        if let Some(username) = var("INFLUX_USERNAME") {
            self.influxdb.username = username;
        }
        if let Some(password) = var("INFLUX_PASSWORD") {
            self.influxdb.password = password;
        }
        if let Some(time_zone) = var("INFLUX_TIME_ZONE") {
            self.influxdb.time_zone = time_zone;
        }

        // Logging overrides
        if let Some(level) = var("INFLUX_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("INFLUX_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Influx Series Configuration
#
# Environment variables override these settings:
# - INFLUX_URL
# - INFLUX_DATABASE
# - INFLUX_USERNAME
# - INFLUX_PASSWORD
# - INFLUX_TIME_ZONE
# - INFLUX_LOG_LEVEL
# - INFLUX_LOG_FORMAT

[influxdb]
# InfluxDB 1.x HTTP endpoint
url = "http://localhost:8086"

# Database every measurement lives in
database = "telemetry"

# Credentials (leave empty when authentication is disabled)
username = ""
password = ""

# Zone appended to statements as tz('...')
time_zone = "Asia/Shanghai"

# Request timeout (ms)
request_timeout_ms = 30000

# How long the measurement list is cached (seconds)
measurements_ttl_secs = 3600

# How long field and tag keys of a measurement are cached (seconds)
measurement_info_ttl_secs = 600

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
