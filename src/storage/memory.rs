//! In-memory storage implementation
//!
//! Listings are split across four maps keyed by MLS number plus the city
//! index. One mutex guards all of them, so every operation sees and leaves a
//! consistent view.

use crate::listing::{city_key, CityEntry, Listing, ListingStatus, PriceSample};
use crate::storage::traits::{
    validate_new_listing, ListingPage, Storage, StorageError, StorageResult,
};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone)]
struct MlsRecord {
    mls_id: String,
    mls_url: String,
    bathrooms: String,
    bedrooms: String,
    land_size: String,
    parking: Vec<String>,
    public_remarks: String,
    stories: String,
    property_type: String,
    list_timestamp: i64,
    status: ListingStatus,
    source: String,
}

#[derive(Debug, Clone)]
struct PropertyRecord {
    address: String,
    zipcode: String,
    latitude: f64,
    longitude: f64,
    city: String,
    state: String,
}

#[derive(Debug, Default)]
struct Tables {
    mls: HashMap<String, MlsRecord>,
    property: HashMap<String, PropertyRecord>,
    photo: HashMap<String, Vec<String>>,
    price_history: HashMap<String, Vec<PriceSample>>,
    city_index: HashMap<String, CityEntry>,
}

impl Tables {
    /// Joins the per-listing maps back into a canonical record
    fn assemble(&self, mls_number: &str) -> Option<Listing> {
        let mls = self.mls.get(mls_number)?;
        let property = self.property.get(mls_number)?;

        Some(Listing {
            mls_number: mls_number.to_string(),
            mls_id: mls.mls_id.clone(),
            mls_url: mls.mls_url.clone(),
            address: property.address.clone(),
            zipcode: property.zipcode.clone(),
            city: property.city.clone(),
            state: property.state.clone(),
            latitude: property.latitude,
            longitude: property.longitude,
            bathrooms: mls.bathrooms.clone(),
            bedrooms: mls.bedrooms.clone(),
            stories: mls.stories.clone(),
            land_size: mls.land_size.clone(),
            property_type: mls.property_type.clone(),
            parking: mls.parking.clone(),
            photo_urls: self.photo.get(mls_number).cloned().unwrap_or_default(),
            public_remarks: mls.public_remarks.clone(),
            list_timestamp: mls.list_timestamp,
            source: mls.source.clone(),
            status: mls.status,
            price_history: self
                .price_history
                .get(mls_number)
                .cloned()
                .unwrap_or_default(),
        })
    }

    fn sorted_mls_numbers(&self) -> Vec<&String> {
        let mut keys: Vec<&String> = self.mls.keys().collect();
        keys.sort();
        keys
    }
}

/// Map-based storage backend
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose city index starts with the given entries
    ///
    /// Entries are keyed case-insensitively; listings saved later for the same
    /// city join the seeded entry.
    pub fn with_city_index(cities: impl IntoIterator<Item = CityEntry>) -> Self {
        let city_index = cities
            .into_iter()
            .map(|entry| (entry.key(), entry))
            .collect();

        Self {
            tables: Mutex::new(Tables {
                city_index,
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

impl Storage for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn create_storage(&self) -> StorageResult<()> {
        Ok(())
    }

    fn save_new_listing(&self, listing: &Listing) -> StorageResult<()> {
        validate_new_listing(listing)?;

        let mut tables = self.lock()?;
        let mls_number = listing.mls_number.clone();
        tracing::debug!("Saving listing {} in memory", mls_number);

        if tables.mls.contains_key(&mls_number) {
            return Err(StorageError::AlreadyExists(mls_number));
        }

        tables
            .city_index
            .entry(city_key(&listing.city, &listing.state))
            .or_insert_with(|| CityEntry::new(&listing.city, &listing.state))
            .mls_numbers
            .insert(mls_number.clone());

        tables.mls.insert(
            mls_number.clone(),
            MlsRecord {
                mls_id: listing.mls_id.clone(),
                mls_url: listing.mls_url.clone(),
                bathrooms: listing.bathrooms.clone(),
                bedrooms: listing.bedrooms.clone(),
                land_size: listing.land_size.clone(),
                parking: listing.parking.clone(),
                public_remarks: listing.public_remarks.clone(),
                stories: listing.stories.clone(),
                property_type: listing.property_type.clone(),
                list_timestamp: listing.list_timestamp,
                status: ListingStatus::Open,
                source: listing.source.clone(),
            },
        );
        tables.property.insert(
            mls_number.clone(),
            PropertyRecord {
                address: listing.address.clone(),
                zipcode: listing.zipcode.clone(),
                latitude: listing.latitude,
                longitude: listing.longitude,
                city: listing.city.clone(),
                state: listing.state.clone(),
            },
        );
        tables
            .photo
            .insert(mls_number.clone(), listing.photo_urls.clone());
        tables
            .price_history
            .insert(mls_number, listing.price_history.clone());

        Ok(())
    }

    fn update_listing(&self, listing: &Listing) -> StorageResult<()> {
        let mut tables = self.lock()?;
        tracing::debug!(
            "Appending {} price sample(s) to listing {}",
            listing.price_history.len(),
            listing.mls_number
        );

        let history = tables
            .price_history
            .get_mut(&listing.mls_number)
            .ok_or_else(|| StorageError::NotFound(listing.mls_number.clone()))?;
        history.extend_from_slice(&listing.price_history);

        Ok(())
    }

    fn read_listing(&self, mls_number: &str) -> StorageResult<Option<Listing>> {
        let tables = self.lock()?;
        Ok(tables.assemble(mls_number))
    }

    fn read_listings_page(&self, offset: usize, limit: usize) -> StorageResult<ListingPage> {
        let tables = self.lock()?;
        let keys = tables.sorted_mls_numbers();

        let listings = keys
            .iter()
            .skip(offset)
            .take(limit)
            .filter_map(|mls_number| tables.assemble(mls_number))
            .collect();

        let end = offset.saturating_add(limit);
        Ok(ListingPage {
            listings,
            next_offset: (end < keys.len()).then_some(end),
        })
    }

    /// Reads every listing under a single lock
    fn read_listings(&self) -> StorageResult<Vec<Listing>> {
        let tables = self.lock()?;
        Ok(tables
            .sorted_mls_numbers()
            .into_iter()
            .filter_map(|mls_number| tables.assemble(mls_number))
            .collect())
    }

    fn read_city_index(&self) -> StorageResult<Vec<CityEntry>> {
        let tables = self.lock()?;
        let mut entries: Vec<(&String, &CityEntry)> = tables.city_index.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        Ok(entries.into_iter().map(|(_, entry)| entry.clone()).collect())
    }
}
