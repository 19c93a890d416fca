//! Configuration module for gator
//!
//! This module handles loading, validating and saving the TOML configuration
//! file that holds the database location, the logged-in user and the
//! aggregator settings.
//!
//! # Example
//!
//! ```no_run
//! use gator::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new(".gatorconfig.toml")).unwrap();
//! println!("Database: {}", config.database_path);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{AggregatorConfig, Config, DEFAULT_CONFIG_FILE};

// Re-export parser functions
pub use parser::{load_config, save_config, set_current_user};
