//! Configuration management for the Bibliotheca core

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// SQLite connection URL (`sqlite://path/to/library.db` or `sqlite::memory:`)
    pub url: String,
    pub max_connections: u32,
    /// Create the database file and any missing collection table instead of
    /// failing with `MissingCollection`.
    pub create_missing: bool,
}

/// Names of the four collection tables. Kept configurable because the
/// deployment owns the store layout; every name is validated as a plain SQL
/// identifier before it is ever interpolated into a statement.
#[derive(Debug, Deserialize, Clone)]
pub struct CollectionsConfig {
    pub books: String,
    pub borrowers: String,
    pub loans: String,
    pub library: String,
}

/// Administrator credentials checked by `AccountsService::login_admin`.
#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub collections: CollectionsConfig,
    pub admin: AdminConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Pull in a local .env file if present, before reading the environment
        dotenvy::dotenv().ok();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default"))
            // Layer on the environment-specific file
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add environment variables (with prefix BIBLIOTHECA_)
            .add_source(
                Environment::with_prefix("BIBLIOTHECA")
                    .separator("_")
                    .try_parsing(true),
            )
            // Override database URL from DATABASE_URL env var if present
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://bibliotheca.db".to_string(),
            max_connections: 5,
            create_missing: false,
        }
    }
}

impl Default for CollectionsConfig {
    fn default() -> Self {
        Self {
            books: "books".to_string(),
            borrowers: "borrowers".to_string(),
            loans: "loans".to_string(),
            library: "library".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
