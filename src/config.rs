//! Connection configuration
//!
//! Discrete connection parameters for when this crate owns the connection
//! lifecycle. Callers who already hold a connected `may_postgres::Client`
//! skip this entirely and use [`crate::Migrator::run_with_client`].

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Discrete connection parameters for the target database.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionParams {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default)]
    pub password: String,

    /// The database migrations are applied to
    pub database: String,

    /// Administrative database used only to create `database` when
    /// `ensure_database_exists` is set; defaults to `postgres`
    #[serde(default)]
    pub default_database: Option<String>,

    /// Schema holding the tracking table; `public` when unset
    #[serde(default)]
    pub schema: Option<String>,

    /// Create the target database before connecting to it
    #[serde(default)]
    pub ensure_database_exists: bool,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_user() -> String {
    "postgres".to_string()
}

impl ConnectionParams {
    /// Parameters for `database` with defaults for everything else.
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: default_user(),
            password: String::new(),
            database: database.into(),
            default_database: None,
            schema: None,
            ensure_database_exists: false,
        }
    }

    /// Load parameters from `config/config.toml`, falling back to
    /// `TIDEMARK__`-prefixed environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when neither source yields a usable
    /// configuration (at minimum, `database` must be set).
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("config/config.toml").required(false))
            .add_source(Environment::with_prefix("TIDEMARK").separator("__"));

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                if std::path::Path::new("config/config.toml").exists() {
                    log::warn!("Failed to load config file, falling back to env: {err}");
                }
                Config::builder()
                    .add_source(Environment::with_prefix("TIDEMARK").separator("__"))
                    .build()?
            }
        };

        settings.try_deserialize()
    }

    /// Key-value connection string for the given database name.
    ///
    /// The database name is a parameter so the bootstrap path can reuse the
    /// same credentials against the administrative database.
    pub fn connection_string(&self, database: &str) -> String {
        let mut parts = vec![
            format!("host={}", self.host),
            format!("port={}", self.port),
            format!("user={}", self.user),
        ];
        if !self.password.is_empty() {
            parts.push(format!("password={}", self.password));
        }
        parts.push(format!("dbname={database}"));
        parts.join(" ")
    }

    /// Name of the administrative database used for `CREATE DATABASE`.
    pub fn admin_database(&self) -> &str {
        self.default_database.as_deref().unwrap_or("postgres")
    }
}
