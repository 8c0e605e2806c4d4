//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{ConfigError, ConfigResult};
use reinhard_core::Snowflake;
use reinhard_framework::{AccessPolicy, BackoffConfig};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReinhardConfig {
    /// Global command prefixes, tried in order.
    #[serde(default = "default_prefixes")]
    pub prefixes: Vec<String>,

    /// User id (as a string key) to access level.
    #[serde(default)]
    pub access_levels: HashMap<String, u32>,

    /// The bot's own user id; enables mention triggers.
    #[serde(default)]
    pub bot_user_id: Option<Snowflake>,

    /// Guild the bot pulls custom emoji from.
    #[serde(default)]
    pub emoji_guild: Option<Snowflake>,

    /// Module identifiers to load, in order.
    #[serde(default)]
    pub modules: Vec<String>,

    /// Per-module settings sections, keyed by module name.
    #[serde(default)]
    pub module_settings: HashMap<String, Value>,

    /// Retry schedule for entity resolvers.
    #[serde(default)]
    pub resolver: BackoffConfig,

    /// Database connection and schema bootstrap.
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for ReinhardConfig {
    fn default() -> Self {
        Self {
            prefixes: default_prefixes(),
            access_levels: HashMap::new(),
            bot_user_id: None,
            emoji_guild: None,
            modules: Vec::new(),
            module_settings: HashMap::new(),
            resolver: BackoffConfig::default(),
            database: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl ReinhardConfig {
    /// Builds the access policy from `access_levels`.
    pub fn access_policy(&self) -> ConfigResult<AccessPolicy> {
        self.access_levels
            .iter()
            .map(|(id, level)| {
                id.trim()
                    .parse::<Snowflake>()
                    .map(|id| (id, *level))
                    .map_err(|_| ConfigError::InvalidAccessId(id.clone()))
            })
            .collect()
    }
}

fn default_prefixes() -> Vec<String> {
    vec![".".to_string()]
}

// =============================================================================
// Database
// =============================================================================

/// Database connection settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Required; never logged.
    pub password: String,

    #[serde(default = "default_postgres")]
    pub database: String,

    #[serde(default = "default_db_host")]
    pub host: String,

    #[serde(default = "default_db_port")]
    pub port: u16,

    #[serde(default = "default_postgres")]
    pub user: String,

    /// Directory the SQL scripts are loaded from.
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: PathBuf,
}

impl DatabaseConfig {
    /// Creates settings with the given password and defaults elsewhere.
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            database: default_postgres(),
            host: default_db_host(),
            port: default_db_port(),
            user: default_postgres(),
            scripts_dir: default_scripts_dir(),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("scripts_dir", &self.scripts_dir)
            .finish()
    }
}

fn default_postgres() -> String {
    "postgres".to_string()
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_scripts_dir() -> PathBuf {
    PathBuf::from("./sql")
}

// =============================================================================
// Logging
// =============================================================================

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Console level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Level for the log file, when `file_path` is set.
    #[serde(default = "default_file_log_level")]
    pub file_level: String,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Optional log file written alongside the console output.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Per-target level overrides, e.g. `reinhard_framework = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, String>,

    #[serde(default)]
    pub thread_ids: bool,

    #[serde(default)]
    pub span_events: SpanEventConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_level: default_file_log_level(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file_path: None,
            filters: HashMap::new(),
            thread_ids: false,
            span_events: SpanEventConfig::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_file_log_level() -> String {
    "warn".to_string()
}

/// Console log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `Full` without it.
    Json,
}

/// Console log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanEventConfig {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReinhardConfig::default();
        assert_eq!(config.prefixes, ["."]);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file_level, "warn");
        assert_eq!(config.resolver.max_attempts, 5);
        assert!(config.database.is_none());
    }

    #[test]
    fn test_database_defaults_and_redaction() {
        let database: DatabaseConfig =
            serde_json::from_value(serde_json::json!({ "password": "hunter2" })).unwrap();
        assert_eq!(database.database, "postgres");
        assert_eq!(database.user, "postgres");
        assert_eq!(database.host, "localhost");
        assert_eq!(database.port, 5432);
        assert_eq!(database.scripts_dir, PathBuf::from("./sql"));

        let debug = format!("{database:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_database_password_is_required() {
        let result = serde_json::from_value::<DatabaseConfig>(serde_json::json!({ "host": "db" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_access_policy() {
        let mut config = ReinhardConfig::default();
        config.access_levels.insert("115590097100865541".into(), 5);
        let policy = config.access_policy().unwrap();
        assert_eq!(policy.level(Snowflake(115590097100865541)), 5);
        assert_eq!(policy.level(Snowflake(1)), 0);

        config.access_levels.insert("not-an-id".into(), 1);
        assert!(matches!(
            config.access_policy(),
            Err(ConfigError::InvalidAccessId(id)) if id == "not-an-id"
        ));
    }
}
