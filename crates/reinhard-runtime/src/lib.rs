//! Reinhard Runtime - Orchestration layer for the Reinhard bot.
//!
//! This crate provides:
//! - Layered configuration loading and validation (`ConfigLoader`)
//! - Logging configuration (`LoggingBuilder`)
//! - SQL script caching and schema bootstrap (`CachedScripts`)
//! - The event loop driving the command client (`ReinhardRuntime`)
//!
//! ```ignore
//! use reinhard_runtime::ReinhardRuntime;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runtime = ReinhardRuntime::builder(services)
//!         .registry(modules::registry())
//!         .build()?;
//!
//!     runtime.run(gateway_events).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod sql;

// Re-exports
pub use config::{
    ConfigError, ConfigLoader, ConfigResult, DatabaseConfig, LoggingConfig, ReinhardConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{ReinhardRuntime, RuntimeBuilder};
pub use sql::{CachedScripts, SchemaExecutor, SqlError, SqlResult, initialise_schema};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Commonly used logging macros.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
