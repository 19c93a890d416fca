use crate::config::types::Config;
use crate::config::validation::{validate, validate_user_name};
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Validates and writes a configuration back to disk
pub fn save_config(path: &Path, config: &Config) -> Result<(), ConfigError> {
    validate(config)?;
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Records `user_name` as the logged-in user and persists the change
///
/// The in-memory config is only updated once the file has been written.
pub fn set_current_user(path: &Path, config: &mut Config, user_name: &str) -> Result<(), ConfigError> {
    validate_user_name(user_name)?;

    let mut updated = config.clone();
    updated.current_user_name = Some(user_name.to_string());
    save_config(path, &updated)?;

    *config = updated;
    Ok(())
}
