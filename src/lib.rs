//! Listing Indexer: collects real-estate listings and keeps their price history
//!
//! This crate fetches listing data from an MLS listing source, normalizes the
//! source's loosely-structured JSON into canonical [`Listing`] records, and
//! persists them through a pluggable storage backend (in-memory or SQLite).

pub mod collector;
pub mod config;
pub mod listing;
pub mod normalize;
pub mod storage;

use thiserror::Error;

/// Main error type for indexer operations
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Unexpected HTTP status {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Normalization error: {0}")]
    Normalize(#[from] normalize::NormalizeError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Collector '{0}' already registered")]
    CollectorExists(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for indexer operations
pub type Result<T> = std::result::Result<T, IndexerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use listing::{CityEntry, Listing, ListingStatus, PriceSample};
pub use normalize::{normalize, normalize_at};
pub use storage::{MemoryStore, SqliteStore, Storage, StorageError};
