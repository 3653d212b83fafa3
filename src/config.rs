//! Configuration for the review store
//!
//! Sources, later ones winning:
//! - Default values
//! - `reviewstore.toml` or `config/reviewstore.toml` in the working directory
//! - An explicit file passed on the command line
//! - Environment variables (`REVIEWSTORE__DATABASE__PATH=...`)
//!
//! ## Example config file (reviewstore.toml):
//! ```toml
//! [database]
//! path = "reviews.db"
//! foreign_keys = true
//!
//! [logging]
//! level = "debug"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file, or `:memory:`
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Have SQLite reject reviews that point at missing rows
    #[serde(default = "default_true")]
    pub foreign_keys: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_database_path() -> String {
    "reviewstore.db".to_string()
}

fn default_true() -> bool {
    true
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            foreign_keys: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_level() }
    }
}

impl StoreConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        for location in ["reviewstore.toml", "config/reviewstore.toml"] {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("REVIEWSTORE")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// In-memory database, for tests and throwaway runs.
    pub fn in_memory() -> Self {
        Self {
            database: DatabaseConfig {
                path: ":memory:".to_string(),
                ..DatabaseConfig::default()
            },
            ..Self::default()
        }
    }
}
