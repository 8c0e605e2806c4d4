//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{DatabaseConfig, LoggingConfig, ReinhardConfig};
use crate::logging::parse_level;
use reinhard_framework::BackoffConfig;

/// Upper bound for resolver delays and jitter: one hour.
const MAX_RESOLVER_DELAY_MS: u64 = 60 * 60 * 1000;

/// Validates the entire configuration.
pub fn validate_config(config: &ReinhardConfig) -> ConfigResult<()> {
    validate_prefixes(&config.prefixes)?;
    validate_modules(&config.modules)?;
    config.access_policy()?;
    validate_backoff(&config.resolver)?;
    validate_logging(&config.logging)?;
    if let Some(database) = &config.database {
        validate_database(database)?;
    }
    Ok(())
}

fn validate_prefixes(prefixes: &[String]) -> ConfigResult<()> {
    if prefixes.is_empty() {
        return Err(ConfigError::validation("At least one prefix is required"));
    }
    if prefixes.iter().any(String::is_empty) {
        return Err(ConfigError::validation("Prefixes cannot be empty"));
    }
    Ok(())
}

fn validate_modules(modules: &[String]) -> ConfigResult<()> {
    if modules.iter().any(|module| module.trim().is_empty()) {
        return Err(ConfigError::validation("Module identifiers cannot be empty"));
    }
    Ok(())
}

fn validate_backoff(backoff: &BackoffConfig) -> ConfigResult<()> {
    if backoff.max_attempts == 0 {
        return Err(ConfigError::validation(
            "Resolver max_attempts must be greater than 0",
        ));
    }

    if backoff.initial_delay_ms == 0 {
        return Err(ConfigError::validation(
            "Resolver initial delay must be greater than 0",
        ));
    }

    if backoff.max_delay_ms < backoff.initial_delay_ms {
        return Err(ConfigError::validation(
            "Resolver max delay must be greater than or equal to initial delay",
        ));
    }

    if !backoff.multiplier.is_finite() || backoff.multiplier < 1.0 {
        return Err(ConfigError::validation(
            "Resolver multiplier must be a finite number of at least 1.0",
        ));
    }

    if backoff.max_delay_ms > MAX_RESOLVER_DELAY_MS || backoff.jitter_ms > MAX_RESOLVER_DELAY_MS {
        return Err(ConfigError::validation(format!(
            "Resolver max delay and jitter cannot exceed {MAX_RESOLVER_DELAY_MS}ms"
        )));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> ConfigResult<()> {
    for (field, level) in [("logging.level", &logging.level), ("logging.file_level", &logging.file_level)] {
        if parse_level(level).is_none() {
            return Err(ConfigError::validation(format!(
                "Invalid log level for {field}: {level}. Valid values are: trace, debug, info, warn, error"
            )));
        }
    }

    for (target, level) in &logging.filters {
        if parse_level(level).is_none() {
            return Err(ConfigError::validation(format!(
                "Invalid log level for filter {target}: {level}"
            )));
        }
    }
    Ok(())
}

fn validate_database(database: &DatabaseConfig) -> ConfigResult<()> {
    if database.password.is_empty() {
        return Err(ConfigError::missing_field("database.password"));
    }
    if database.port == 0 {
        return Err(ConfigError::InvalidPort(database.port));
    }
    Ok(())
}
