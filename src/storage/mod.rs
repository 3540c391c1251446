//! Storage module for persisting listings
//!
//! This module holds the storage contract and its two backends:
//! - An in-memory store built from maps behind a single mutex
//! - A SQLite store that spreads each listing over six relational tables
//!
//! Both keep an append-only price history per listing and a city index
//! keyed case-insensitively by `(city, state)`.

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use schema::{initialize_schema, SCHEMA_SQL};
pub use sqlite::SqliteStore;
pub use traits::{ListingPage, Storage, StorageError, StorageResult, DEFAULT_PAGE_SIZE};

use crate::config::{CityConfig, StorageBackend, StorageConfig};
use crate::listing::CityEntry;

use std::path::Path;
use std::sync::Arc;

/// Opens the configured storage backend and creates its schema
///
/// # Arguments
///
/// * `config` - Storage section of the configuration
/// * `cities` - City index seed entries, used by the memory backend
///
/// # Returns
///
/// * `Ok(Arc<dyn Storage>)` - Ready-to-use storage shared between collectors
/// * `Err(IndexerError)` - Failed to open the database or create the schema
pub fn open_storage(
    config: &StorageConfig,
    cities: &[CityConfig],
) -> crate::Result<Arc<dyn Storage>> {
    let storage: Arc<dyn Storage> = match config.backend {
        StorageBackend::Memory => Arc::new(MemoryStore::with_city_index(
            cities
                .iter()
                .map(|city| CityEntry::new(city.name.as_str(), city.state.as_str())),
        )),
        StorageBackend::Sqlite => Arc::new(SqliteStore::new(
            Path::new(&config.database_path),
            config.read_page_size,
        )?),
    };

    storage.create_storage()?;
    tracing::info!("Opened {} storage", storage.backend_name());

    Ok(storage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_memory_storage_seeds_cities() {
        let config = StorageConfig {
            backend: StorageBackend::Memory,
            database_path: String::new(),
            read_page_size: 10,
        };
        let cities = vec![CityConfig {
            name: "Windsor".to_string(),
            state: "Ontario".to_string(),
        }];

        let storage = open_storage(&config, &cities).unwrap();
        assert_eq!(storage.backend_name(), "memory");

        let index = storage.read_city_index().unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index[0].name, "Windsor");
        assert!(index[0].mls_numbers.is_empty());
    }

    #[test]
    fn test_open_sqlite_storage() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::Sqlite,
            database_path: dir.path().join("listings.db").display().to_string(),
            read_page_size: 5,
        };

        let storage = open_storage(&config, &[]).unwrap();
        assert_eq!(storage.backend_name(), "sqlite");
        assert_eq!(storage.page_size(), 5);
        assert!(storage.read_listings().unwrap().is_empty());
    }
}
