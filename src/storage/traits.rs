//! Storage traits and error types
//!
//! This module defines the trait interface shared by the listing storage
//! backends and associated error types.

use crate::listing::{CityEntry, Listing};
use thiserror::Error;

/// Page size used by `read_listings` when a backend does not choose one
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Listing {0} already exists")]
    AlreadyExists(String),

    #[error("Listing {0} does not exist")]
    NotFound(String),

    #[error("Invalid listing: {0}")]
    InvalidListing(String),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// One page of stored listings
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    pub listings: Vec<Listing>,
    /// Offset of the following page, `None` when this page is the last
    pub next_offset: Option<usize>,
}

/// Trait for listing storage backends
///
/// Implementations own their backing handle and synchronise internally, so a
/// store can be shared between the collection loop and readers behind an `Arc`.
pub trait Storage: Send + Sync {
    /// Short backend name used in logs
    fn backend_name(&self) -> &'static str;

    /// Page size used by `read_listings`
    fn page_size(&self) -> usize {
        DEFAULT_PAGE_SIZE
    }

    /// Initializes the backing schema
    ///
    /// Safe to call repeatedly; a no-op after the first success.
    fn create_storage(&self) -> StorageResult<()>;

    /// Stores a listing seen for the first time
    ///
    /// Records the listing, its price samples, and adds it to the city index
    /// entry for its `(city, state)`, creating that entry if needed.
    ///
    /// # Errors
    ///
    /// * `AlreadyExists` - a listing with the same MLS number is stored
    /// * `InvalidListing` - the MLS number is empty or there is no price sample
    fn save_new_listing(&self, listing: &Listing) -> StorageResult<()>;

    /// Appends the listing's price samples to its price history
    ///
    /// No other stored field changes.
    ///
    /// # Errors
    ///
    /// * `NotFound` - no listing with this MLS number is stored
    fn update_listing(&self, listing: &Listing) -> StorageResult<()>;

    /// Reads one listing; absence is `Ok(None)`
    fn read_listing(&self, mls_number: &str) -> StorageResult<Option<Listing>>;

    /// Reads one page of listings, ordered by MLS number
    fn read_listings_page(&self, offset: usize, limit: usize) -> StorageResult<ListingPage>;

    /// Reads every stored listing with its price history attached
    fn read_listings(&self) -> StorageResult<Vec<Listing>> {
        let limit = self.page_size().max(1);
        let mut listings = Vec::new();
        let mut offset = Some(0);

        while let Some(current) = offset {
            let page = self.read_listings_page(current, limit)?;
            listings.extend(page.listings);
            offset = page.next_offset;
        }

        Ok(listings)
    }

    /// Reads the city index, ordered by key
    fn read_city_index(&self) -> StorageResult<Vec<CityEntry>>;
}

/// Rejects listings that cannot be keyed or have no initial price sample
pub(crate) fn validate_new_listing(listing: &Listing) -> StorageResult<()> {
    if listing.mls_number.is_empty() {
        return Err(StorageError::InvalidListing(
            "listing has no MLS number".to_string(),
        ));
    }

    if listing.price_history.is_empty() {
        return Err(StorageError::InvalidListing(format!(
            "listing {} has no price sample",
            listing.mls_number
        )));
    }

    Ok(())
}
