use crate::config::types::{AggregatorConfig, Config};
use crate::ConfigError;

/// Longest fetch timeout accepted, in seconds
const MAX_FETCH_TIMEOUT_SECS: u64 = 300;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.database_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if let Some(name) = &config.current_user_name {
        validate_user_name(name)?;
    }

    validate_aggregator_config(&config.aggregator)?;
    Ok(())
}

/// Validates a user name before it is stored in the config
pub fn validate_user_name(name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "current_user_name cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_aggregator_config(config: &AggregatorConfig) -> Result<(), ConfigError> {
    if config.fetch_timeout_secs < 1 || config.fetch_timeout_secs > MAX_FETCH_TIMEOUT_SECS {
        return Err(ConfigError::Validation(format!(
            "fetch_timeout_secs must be between 1 and {}, got {}",
            MAX_FETCH_TIMEOUT_SECS, config.fetch_timeout_secs
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}
