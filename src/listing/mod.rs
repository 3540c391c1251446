//! Canonical listing model
//!
//! This module defines the records shared by the normalizer, the storage
//! backends and anything that reads stored listings back out:
//!
//! - `Listing`: one normalized listing, keyed by its MLS number
//! - `PriceSample`: one entry of a listing's append-only price history
//! - `CityEntry`: one entry of the city secondary index
//! - `ListingStatus`: lifecycle status of a listing

mod status;

pub use status::ListingStatus;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Price recorded when the source price cannot be parsed
pub const UNPARSABLE_PRICE: i32 = -1;

/// Coordinate recorded when the source latitude/longitude cannot be parsed
pub const UNPARSABLE_COORDINATE: f64 = 0.0;

/// One price observation for a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSample {
    pub price: i32,
    /// Epoch seconds
    pub timestamp: i64,
}

/// A normalized real-estate listing
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub mls_number: String,
    pub mls_id: String,
    pub mls_url: String,
    pub address: String,
    pub zipcode: String,
    pub city: String,
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
    pub bathrooms: String,
    pub bedrooms: String,
    pub stories: String,
    pub land_size: String,
    pub property_type: String,
    /// One entry per source parking record, empty names included
    pub parking: Vec<String>,
    /// One entry per source photo that carried any resolution path
    pub photo_urls: Vec<String>,
    pub public_remarks: String,
    /// Epoch seconds
    pub list_timestamp: i64,
    pub source: String,
    pub status: ListingStatus,
    pub price_history: Vec<PriceSample>,
}

impl Listing {
    /// Returns the lowercase `city,state` key used by the city index
    pub fn city_key(&self) -> String {
        city_key(&self.city, &self.state)
    }
}

/// Builds the case-insensitive city index key
pub fn city_key(city: &str, state: &str) -> String {
    format!("{},{}", city.to_lowercase(), state.to_lowercase())
}

/// City index entry: the listings located in one city
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityEntry {
    /// Display-cased city name
    pub name: String,
    /// Display-cased state or province
    pub state: String,
    pub mls_numbers: BTreeSet<String>,
}

impl CityEntry {
    pub fn new(name: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: state.into(),
            mls_numbers: BTreeSet::new(),
        }
    }

    pub fn key(&self) -> String {
        city_key(&self.name, &self.state)
    }
}
