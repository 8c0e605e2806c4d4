//! Runtime error types.

use thiserror::Error;

pub use crate::config::{ConfigError, ConfigResult};
use crate::sql::SqlError;
use reinhard_framework::FrameworkError;

/// Errors that can occur while building or running the bot.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Module loading failed.
    #[error("Failed to load modules: {0}")]
    Framework(#[from] FrameworkError),

    /// SQL scripts could not be loaded or the schema failed.
    #[error("Database bootstrap failed: {0}")]
    Sql(#[from] SqlError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
