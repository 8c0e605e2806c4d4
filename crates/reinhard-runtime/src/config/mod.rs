//! Configuration module for the Reinhard runtime.
//!
//! Layered loading (defaults, config files, `REINHARD_*` environment
//! variables) and validation of the bot's settings.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    DatabaseConfig, LogFormat, LogOutput, LoggingConfig, ReinhardConfig, SpanEventConfig,
};
pub use validation::validate_config;
