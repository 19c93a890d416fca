//! Gator: a command-line RSS feed aggregator
//!
//! Users register feeds and follow them; the aggregator loop periodically
//! picks the feed that has waited longest, fetches its document and stores
//! new entries as posts, deduplicated by URL.

pub mod aggregator;
pub mod commands;
pub mod config;
pub mod storage;

use thiserror::Error;

/// Main error type for gator operations
#[derive(Debug, Error)]
pub enum GatorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error(transparent)]
    InvalidDuration(#[from] aggregator::InvalidDuration),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("usage: {0}")]
    Usage(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Not logged in: run `register <name>` or `login <name>` first")]
    NotLoggedIn,

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("Feed not found: {0}")]
    FeedNotFound(String),

    #[error("Not following feed: {0}")]
    NotFollowing(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for gator operations
pub type Result<T> = std::result::Result<T, GatorError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use aggregator::{parse_duration, Scheduler};
pub use config::Config;
pub use storage::{Feed, Post, SqliteStorage, User};
