//! Configuration management for the Hainan Weather Service
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with HWS_ prefix

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

    /// QWeather API configuration
    pub qweather: QWeatherConfig,

    /// Background job configuration
    pub scheduler: SchedulerConfig,
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
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QWeatherConfig {
    /// Per-account API host, e.g. https://xxxx.re.qweatherapi.com
    pub base_url: String,

    /// API key sent on every request
    pub api_key: String,

    /// Header carrying the API key
    pub api_key_header: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerConfig {
    /// Run background jobs at all
    pub enabled: bool,

    /// Cron expression (with seconds) for the regular sync
    pub hourly_cron: String,

    /// Run the fixed-delay diagnostic sync as well
    pub diagnostic_enabled: bool,

    /// Delay before the first diagnostic sync
    pub diagnostic_initial_delay_secs: u64,

    /// Period between diagnostic syncs
    pub diagnostic_period_secs: u64,

    /// Mark past-expiry alerts as EXPIRED on a schedule
    pub expiry_sweep_enabled: bool,

    /// Cron expression (with seconds) for the expiry sweep
    pub expiry_sweep_cron: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("HWS_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 8080)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("qweather.api_key_header", "X-QW-Api-Key")?
            .set_default("qweather.timeout_secs", 10)?
            .set_default("scheduler.enabled", true)?
            .set_default("scheduler.hourly_cron", "0 0 * * * *")?
            .set_default("scheduler.diagnostic_enabled", false)?
            .set_default("scheduler.diagnostic_initial_delay_secs", 10)?
            .set_default("scheduler.diagnostic_period_secs", 300)?
            .set_default("scheduler.expiry_sweep_enabled", true)?
            .set_default("scheduler.expiry_sweep_cron", "0 */10 * * * *")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (HWS_ prefix)
            .add_source(
                Environment::with_prefix("HWS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hourly_cron: "0 0 * * * *".to_string(),
            diagnostic_enabled: false,
            diagnostic_initial_delay_secs: 10,
            diagnostic_period_secs: 300,
            expiry_sweep_enabled: true,
            expiry_sweep_cron: "0 */10 * * * *".to_string(),
        }
    }
}
