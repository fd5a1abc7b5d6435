//! # Service Configuration
//!
//! Runtime settings, loaded from `NIAGA_*` environment variables with
//! fallback to defaults.
//!
//! | Variable                     | Default              |
//! |------------------------------|----------------------|
//! | `NIAGA_DB_PATH`              | `./niaga.db`         |
//! | `NIAGA_DB_MAX_CONNECTIONS`   | `5`                  |
//! | `NIAGA_DB_BUSY_TIMEOUT_MS`   | `5000`               |
//! | `NIAGA_LOW_STOCK_THRESHOLD`  | `5`                  |
//! | `NIAGA_DASHBOARD_LIMIT`      | `5`                  |
//! | `NIAGA_MAX_WRITE_ATTEMPTS`   | `5`                  |
//! | `NIAGA_UTC_OFFSET_MINUTES`   | `420` (UTC+7)        |
//! | `NIAGA_DEFAULT_CURRENCY`     | `IDR`                |
//! | `NIAGA_WALK_IN_CUSTOMER`     | `Pelanggan Umum`     |

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use niaga_core::{Quantity, DEFAULT_CURRENCY};
use niaga_db::DbConfig;

/// Service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// SQLite database file, or `:memory:`.
    pub database_path: PathBuf,

    pub max_connections: u32,

    /// How long a writer waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Items with stock at or below this are "low stock".
    pub low_stock_threshold: Quantity,

    /// Length of the dashboard's low-stock, recent-sales and top-items lists.
    pub dashboard_list_limit: u32,

    /// How many times a sale or restock is run before a write conflict is
    /// reported to the caller.
    pub max_write_attempts: u32,

    /// Offset of the store's local time from UTC. Decides where "today"
    /// starts on the dashboard.
    pub utc_offset_minutes: i32,

    /// Currency given to items created without one.
    pub default_currency: String,

    /// Customer name printed on receipts of sales without one.
    pub walk_in_customer: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            database_path: PathBuf::from("./niaga.db"),
            max_connections: 5,
            busy_timeout_ms: 5_000,
            low_stock_threshold: Quantity::from_units(5),
            dashboard_list_limit: 5,
            max_write_attempts: 5,
            utc_offset_minutes: 7 * 60,
            default_currency: DEFAULT_CURRENCY.to_string(),
            walk_in_customer: "Pelanggan Umum".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = ServiceConfig::default();

        let config = ServiceConfig {
            database_path: env::var("NIAGA_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            max_connections: parse_var("NIAGA_DB_MAX_CONNECTIONS", defaults.max_connections)?,

            busy_timeout_ms: parse_var("NIAGA_DB_BUSY_TIMEOUT_MS", defaults.busy_timeout_ms)?,

            low_stock_threshold: parse_var(
                "NIAGA_LOW_STOCK_THRESHOLD",
                defaults.low_stock_threshold,
            )?,

            dashboard_list_limit: parse_var(
                "NIAGA_DASHBOARD_LIMIT",
                defaults.dashboard_list_limit,
            )?,

            max_write_attempts: parse_var("NIAGA_MAX_WRITE_ATTEMPTS", defaults.max_write_attempts)?,

            utc_offset_minutes: parse_var("NIAGA_UTC_OFFSET_MINUTES", defaults.utc_offset_minutes)?,

            default_currency: env::var("NIAGA_DEFAULT_CURRENCY")
                .unwrap_or(defaults.default_currency),

            walk_in_customer: env::var("NIAGA_WALK_IN_CUSTOMER")
                .unwrap_or(defaults.walk_in_customer),
        };

        config.validate()?;
        Ok(config)
    }

    /// Default settings on a private in-memory database.
    pub fn in_memory() -> Self {
        ServiceConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            ..ServiceConfig::default()
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("NIAGA_DB_MAX_CONNECTIONS".to_string()));
        }
        if self.max_write_attempts == 0 {
            return Err(ConfigError::InvalidValue("NIAGA_MAX_WRITE_ATTEMPTS".to_string()));
        }
        if self.low_stock_threshold.is_negative() {
            return Err(ConfigError::InvalidValue("NIAGA_LOW_STOCK_THRESHOLD".to_string()));
        }
        if self.local_offset().is_none() {
            return Err(ConfigError::InvalidValue("NIAGA_UTC_OFFSET_MINUTES".to_string()));
        }
        if niaga_core::validation::validate_currency(&self.default_currency).is_err() {
            return Err(ConfigError::InvalidValue("NIAGA_DEFAULT_CURRENCY".to_string()));
        }
        Ok(())
    }

    /// The store's UTC offset, `None` when out of range (±24h).
    pub fn local_offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes.checked_mul(60)?)
    }

    /// Pool settings for this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone())
            .max_connections(self.max_connections)
            .busy_timeout(Duration::from_millis(self.busy_timeout_ms))
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        Err(_) => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
