//! Configuration module for the listing indexer
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use listing_indexer::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Collecting from: {}", config.source.endpoint);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CityConfig, Config, ScheduleConfig, SearchConfig, SourceConfig, StorageBackend, StorageConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
