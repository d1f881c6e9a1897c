//! Configuration management for the book index server

use config::{
    builder::{ConfigBuilder, DefaultState},
    Config, ConfigError, Environment, File,
};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    /// Seconds to wait for a pooled connection before giving up
    pub acquire_timeout_secs: u64,
    /// libpq-style ssl mode; `require` encrypts without verifying the peer
    pub ssl_mode: String,
    /// Run embedded migrations at startup (forces eager secret resolution)
    pub run_migrations: bool,
}

/// Where the database connection string comes from
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SecretProvider {
    /// Use `secrets.database_url` as-is
    Static,
    /// Fetch `secrets.secret_id` from the secrets HTTP endpoint
    Http,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SecretsConfig {
    pub provider: SecretProvider,
    pub secret_id: String,
    pub database_url: Option<String>,
    pub endpoint: String,
    pub version_stage: String,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    /// Lifetime of the memoized unfiltered row count
    pub count_cache_ttl_secs: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub secrets: SecretsConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_environment() -> String {
    "development".to_string()
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = with_session_token(Config::builder(), env::var("AWS_SESSION_TOKEN").ok())?
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on the environment-specific file
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add environment variables (with prefix BOOK_INDEX_)
            .add_source(
                Environment::with_prefix("BOOK_INDEX")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override("environment", run_mode)?
            .set_override_option("secrets.database_url", env::var("DATABASE_URL").ok())?
            .set_override_option("secrets.secret_id", env::var("SECRET_NAME").ok())?
            .build()?;

        config.try_deserialize()
    }

    /// Detailed store errors are only echoed back outside production
    pub fn expose_error_details(&self) -> bool {
        self.environment != "production"
    }
}

/// The secrets endpoint authenticates with the runtime session token;
/// it sits below every other source so a configured token wins.
fn with_session_token(
    builder: ConfigBuilder<DefaultState>,
    token: Option<String>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match token {
        Some(token) => builder.set_default("secrets.token", token),
        None => Ok(builder),
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            secrets: SecretsConfig::default(),
            search: SearchConfig::default(),
            logging: LoggingConfig::default(),
            environment: default_environment(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 0,
            acquire_timeout_secs: 10,
            ssl_mode: "require".to_string(),
            run_migrations: false,
        }
    }
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            provider: SecretProvider::Static,
            secret_id: String::new(),
            database_url: None,
            endpoint: "http://localhost:2773".to_string(),
            version_stage: "AWSCURRENT".to_string(),
            token: None,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            count_cache_ttl_secs: 60,
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
