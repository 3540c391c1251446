//! Listing normalizer
//!
//! Converts a raw search response from the listing source into canonical
//! [`Listing`] records keyed by MLS number. The only failure is a payload that
//! is not well-formed JSON of the expected shape; every per-field problem
//! degrades to a documented fallback or sentinel instead:
//!
//! | Field | Rule |
//! |-------|------|
//! | `mls_url` | details URL, else the English URL |
//! | `property_type` | building type, else the property type |
//! | `photo_urls` | per photo: high, else medium, else low resolution; photos with no path are skipped |
//! | `parking` | per parking entry: its name, empty if absent |
//! | price | `$` and `,` stripped, parsed as `i32`; `-1` on failure |
//! | `latitude`/`longitude` | parsed as `f64`; `0.0` on failure |
//! | `city`/`state`/`zipcode` | from `street|city, state zip`; empty unless the address has exactly one `|` |
//!
//! All text fields are whitespace-trimmed.

mod payload;

pub use payload::{RawListing, SearchResponse};

use crate::listing::{Listing, ListingStatus, PriceSample, UNPARSABLE_COORDINATE, UNPARSABLE_PRICE};
use chrono::Utc;
use payload::{RawAddress, RawPhoto};
use std::collections::BTreeMap;
use thiserror::Error;

/// Source tag recorded on listings collected from MLS Canada
pub const DEFAULT_SOURCE: &str = "mls-canada";

/// Errors that abort normalization of a whole batch
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Malformed listing payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
}

/// Normalized listings keyed by MLS number
pub type NormalizedListings = BTreeMap<String, Listing>;

/// Normalizes a raw payload, stamping the first price sample with the current time
pub fn normalize(raw: &[u8], source: &str) -> Result<NormalizedListings, NormalizeError> {
    normalize_at(raw, source, Utc::now().timestamp())
}

/// Normalizes a raw payload with an explicit collection timestamp
///
/// This is a pure function of its inputs: the same bytes, source and timestamp
/// always produce the same listings. When two results share an MLS number the
/// later one wins.
///
/// # Arguments
///
/// * `raw` - Response body of the listing source
/// * `source` - Origin tag recorded on every listing
/// * `timestamp` - Epoch seconds used for the first price sample and list timestamp
pub fn normalize_at(
    raw: &[u8],
    source: &str,
    timestamp: i64,
) -> Result<NormalizedListings, NormalizeError> {
    let response: SearchResponse = serde_json::from_slice(raw)?;

    Ok(response
        .results
        .unwrap_or_default()
        .iter()
        .map(|record| normalize_listing(record, source, timestamp))
        .map(|listing| (listing.mls_number.clone(), listing))
        .collect())
}

/// Normalizes a single source record
pub fn normalize_listing(raw: &RawListing, source: &str, timestamp: i64) -> Listing {
    let building = raw.building.as_ref();
    let property = raw.property.as_ref();
    let address = property.and_then(|p| p.address.as_ref());

    let address_text = text(address.and_then(|a| a.address_text.as_deref()));
    let (city, state, zipcode) = split_city_state_zip(&address_text);
    let (latitude, longitude) = parse_coordinates(address);

    let price = parse_price(property.and_then(|p| p.price.as_deref()).unwrap_or_default());

    Listing {
        mls_number: text(raw.mls_number.as_deref()),
        mls_id: text(raw.id.as_deref()),
        mls_url: first_non_empty(&[
            raw.relative_details_url.as_deref(),
            raw.relative_url_en.as_deref(),
        ]),
        address: address_text,
        zipcode,
        city,
        state,
        latitude,
        longitude,
        bathrooms: text(building.and_then(|b| b.bathroom_total.as_deref())),
        bedrooms: text(building.and_then(|b| b.bedrooms.as_deref())),
        stories: text(building.and_then(|b| b.stories_total.as_deref())),
        land_size: text(raw.land.as_ref().and_then(|l| l.size_total.as_deref())),
        property_type: first_non_empty(&[
            building.and_then(|b| b.building_type.as_deref()),
            property.and_then(|p| p.property_type.as_deref()),
        ]),
        parking: property
            .map(|p| {
                p.parkings
                    .iter()
                    .map(|parking| text(parking.name.as_deref()))
                    .collect()
            })
            .unwrap_or_default(),
        photo_urls: property
            .map(|p| p.photos.iter().filter_map(select_photo).collect())
            .unwrap_or_default(),
        public_remarks: text(raw.public_remarks.as_deref()),
        list_timestamp: timestamp,
        source: source.to_string(),
        status: ListingStatus::Open,
        price_history: vec![PriceSample { price, timestamp }],
    }
}

/// Parses a source price such as `$10,000`
///
/// Leading currency symbols and thousands separators are removed before the
/// integer parse. Anything that still fails to parse yields `-1`.
pub fn parse_price(raw: &str) -> i32 {
    raw.trim()
        .trim_start_matches('$')
        .replace(',', "")
        .parse()
        .unwrap_or(UNPARSABLE_PRICE)
}

/// Parses a coordinate, yielding `0.0` when it is missing, malformed or not finite
pub fn parse_coordinate(raw: Option<&str>) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(UNPARSABLE_COORDINATE)
}

fn parse_coordinates(address: Option<&RawAddress>) -> (f64, f64) {
    (
        parse_coordinate(address.and_then(|a| a.latitude.as_deref())),
        parse_coordinate(address.and_then(|a| a.longitude.as_deref())),
    )
}

/// Picks the best available resolution for one photo
fn select_photo(photo: &RawPhoto) -> Option<String> {
    [
        photo.high_res_path.as_deref(),
        photo.med_res_path.as_deref(),
        photo.low_res_path.as_deref(),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .find(|path| !path.is_empty())
    .map(str::to_string)
}

/// Splits `street|city, state zip` into `(city, state, zipcode)`
///
/// Yields three empty strings unless the address has exactly two `|`-separated
/// segments and the second has at least three whitespace-separated tokens.
/// A city spanning several tokens is recognised by its trailing comma
/// (`St. Thomas, Ontario N5R1A1`); otherwise the first three tokens are taken
/// in order.
pub fn split_city_state_zip(address: &str) -> (String, String, String) {
    let segments: Vec<&str> = address.split('|').collect();
    if segments.len() != 2 {
        return Default::default();
    }

    let tokens: Vec<&str> = segments[1].split_whitespace().collect();
    if tokens.len() < 3 {
        return Default::default();
    }

    let comma = tokens
        .iter()
        .position(|t| t.ends_with(','))
        .filter(|&i| tokens.len() - i > 2);
    let (city_end, zipcode) = match comma {
        Some(i) => (i, tokens[i + 2..].join(" ")),
        None => (0, tokens[2].to_string()),
    };

    let city = tokens[..=city_end].join(" ");
    let city = city.trim_end_matches(',').trim().to_string();
    let state = tokens[city_end + 1].to_string();

    (city, state, zipcode)
}

/// Returns the trimmed value of the first candidate that is non-empty after trimming
fn first_non_empty(candidates: &[Option<&str>]) -> String {
    candidates
        .iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn text(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}
