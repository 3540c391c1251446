//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.
//! A listing is spread over the `city`, `property`, `mls`, `photo` and
//! `priceHistory` tables and reassembled with joins on read. The `property`
//! row is shared by every listing at one address, so the per-listing zip,
//! coordinates and city are read from `mls`.

use crate::listing::{
    city_key, CityEntry, Listing, ListingStatus, PriceSample, UNPARSABLE_COORDINATE,
};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{
    validate_new_listing, ListingPage, Storage, StorageError, StorageResult, DEFAULT_PAGE_SIZE,
};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const LISTING_SELECT: &str = "
    SELECT mls.mlsNumber, mls.mlsId, mls.mlsUrl, mls.bathrooms, mls.bedrooms, mls.landSize,
           mls.parking, mls.publicRemark, mls.stories, mls.propertyType, mls.availableTimestamp,
           listingStatus.status, mls.source, mls.address, mls.zipcode, mls.latitude,
           mls.longitude, mls.city, mls.state
    FROM mls
    INNER JOIN property ON mls.address = property.address
    INNER JOIN listingStatus ON mls.statusId = listingStatus.statusId";

struct Connected {
    conn: Connection,
    schema_created: bool,
}

impl Connected {
    /// Creates the schema once per store instance
    fn ensure_schema(&mut self) -> StorageResult<()> {
        if !self.schema_created {
            initialize_schema(&self.conn)?;
            self.schema_created = true;
            tracing::debug!("Listing schema initialized");
        }
        Ok(())
    }
}

/// SQLite storage backend
pub struct SqliteStore {
    state: Mutex<Connected>,
    page_size: usize,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `page_size` - Number of listings read per query by `read_listings`
    pub fn new(path: &Path, page_size: usize) -> crate::Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        Ok(Self::from_connection(conn, page_size))
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> crate::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self::from_connection(conn, DEFAULT_PAGE_SIZE))
    }

    fn from_connection(conn: Connection, page_size: usize) -> Self {
        Self {
            state: Mutex::new(Connected {
                conn,
                schema_created: false,
            }),
            page_size: page_size.max(1),
        }
    }

    /// Locks the connection and makes sure the schema exists
    fn connect(&self) -> StorageResult<MutexGuard<'_, Connected>> {
        let mut state = self.state.lock().map_err(|_| StorageError::LockPoisoned)?;
        state.ensure_schema()?;
        Ok(state)
    }
}

impl Storage for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    fn create_storage(&self) -> StorageResult<()> {
        self.connect().map(|_| ())
    }

    fn save_new_listing(&self, listing: &Listing) -> StorageResult<()> {
        validate_new_listing(listing)?;

        let mut state = self.connect()?;
        tracing::debug!("Saving listing {} to sqlite", listing.mls_number);

        let tx = state.conn.transaction()?;

        if listing_exists(&tx, &listing.mls_number)? {
            return Err(StorageError::AlreadyExists(listing.mls_number.clone()));
        }

        if !city_exists(&tx, &listing.city, &listing.state)? {
            insert_city(&tx, &listing.city, &listing.state)?;
        }
        insert_property(&tx, listing)?;
        insert_mls(&tx, listing)?;
        insert_photos(&tx, listing)?;
        insert_price_history(&tx, &listing.mls_number, &listing.price_history)?;

        tx.commit()?;
        Ok(())
    }

    fn update_listing(&self, listing: &Listing) -> StorageResult<()> {
        let mut state = self.connect()?;
        tracing::debug!(
            "Appending {} price sample(s) to listing {}",
            listing.price_history.len(),
            listing.mls_number
        );

        let tx = state.conn.transaction()?;

        if !listing_exists(&tx, &listing.mls_number)? {
            return Err(StorageError::NotFound(listing.mls_number.clone()));
        }
        insert_price_history(&tx, &listing.mls_number, &listing.price_history)?;

        tx.commit()?;
        Ok(())
    }

    fn read_listing(&self, mls_number: &str) -> StorageResult<Option<Listing>> {
        let state = self.connect()?;

        let row = state
            .conn
            .query_row(
                &format!("{} WHERE mls.mlsNumber = ?1", LISTING_SELECT),
                params![mls_number],
                listing_from_row,
            )
            .optional()?;

        match row {
            Some(row) => Ok(attach_details(&state.conn, vec![row])?.pop()),
            None => Ok(None),
        }
    }

    fn read_listings_page(&self, offset: usize, limit: usize) -> StorageResult<ListingPage> {
        let state = self.connect()?;
        select_page(&state.conn, offset, limit)
    }

    /// Walks every page under a single lock so concurrent saves cannot shift pages
    fn read_listings(&self) -> StorageResult<Vec<Listing>> {
        let state = self.connect()?;
        let mut listings = Vec::new();
        let mut offset = Some(0);

        while let Some(current) = offset {
            let page = select_page(&state.conn, current, self.page_size)?;
            listings.extend(page.listings);
            offset = page.next_offset;
        }

        Ok(listings)
    }

    fn read_city_index(&self) -> StorageResult<Vec<CityEntry>> {
        let state = self.connect()?;

        let mut stmt = state.conn.prepare(
            "SELECT city.name, city.state, mls.mlsNumber
             FROM city
             LEFT JOIN mls ON city.name = mls.city AND city.state = mls.state",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?;

        let mut index: BTreeMap<String, CityEntry> = BTreeMap::new();
        for row in rows {
            let (name, state, mls_number) = row?;
            let entry = index
                .entry(city_key(&name, &state))
                .or_insert_with(|| CityEntry::new(name, state));
            if let Some(mls_number) = mls_number {
                entry.mls_numbers.insert(mls_number);
            }
        }

        Ok(index.into_values().collect())
    }
}

/// Intermediate row: the listing without photos or prices, plus its raw parking column
struct ListingRow {
    listing: Listing,
    parking: Option<String>,
}

fn listing_from_row(row: &Row<'_>) -> rusqlite::Result<ListingRow> {
    let status: String = row.get(11)?;

    Ok(ListingRow {
        listing: Listing {
            mls_number: row.get(0)?,
            mls_id: row.get(1)?,
            mls_url: row.get(2)?,
            bathrooms: row.get(3)?,
            bedrooms: row.get(4)?,
            land_size: row.get(5)?,
            public_remarks: row.get(7)?,
            stories: row.get(8)?,
            property_type: row.get(9)?,
            list_timestamp: row.get(10)?,
            status: ListingStatus::from_name(&status).unwrap_or_default(),
            source: row.get(12)?,
            address: row.get(13)?,
            zipcode: row.get(14)?,
            latitude: row
                .get::<_, Option<f64>>(15)?
                .unwrap_or(UNPARSABLE_COORDINATE),
            longitude: row
                .get::<_, Option<f64>>(16)?
                .unwrap_or(UNPARSABLE_COORDINATE),
            city: row.get(17)?,
            state: row.get(18)?,
            ..Default::default()
        },
        parking: row.get(6)?,
    })
}

/// Reads one page of open listings ordered by MLS number
fn select_page(conn: &Connection, offset: usize, limit: usize) -> StorageResult<ListingPage> {
    // One extra row tells whether another page follows
    let mut stmt = conn.prepare(&format!(
        "{} WHERE listingStatus.status = ?1 ORDER BY mls.mlsNumber LIMIT ?2 OFFSET ?3",
        LISTING_SELECT
    ))?;
    let mut rows = stmt
        .query_map(
            params![
                ListingStatus::Open.name(),
                limit.saturating_add(1) as i64,
                offset as i64
            ],
            listing_from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;

    let next_offset = if rows.len() > limit {
        rows.truncate(limit);
        Some(offset + limit)
    } else {
        None
    };

    Ok(ListingPage {
        listings: attach_details(conn, rows)?,
        next_offset,
    })
}

/// Decodes parking and attaches photos and price history to a batch of rows
///
/// Photos and prices for the whole batch are fetched with one query each.
fn attach_details(conn: &Connection, rows: Vec<ListingRow>) -> StorageResult<Vec<Listing>> {
    let mls_numbers: Vec<&str> = rows.iter().map(|r| r.listing.mls_number.as_str()).collect();
    let mut photos = load_photos(conn, &mls_numbers)?;
    let mut prices = load_price_history(conn, &mls_numbers)?;

    rows.into_iter()
        .map(|row| {
            let mut listing = row.listing;
            listing.parking = decode_parking(row.parking.as_deref())?;
            listing.photo_urls = photos.remove(&listing.mls_number).unwrap_or_default();
            listing.price_history = prices.remove(&listing.mls_number).unwrap_or_default();
            Ok(listing)
        })
        .collect()
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn load_photos(
    conn: &Connection,
    mls_numbers: &[&str],
) -> StorageResult<HashMap<String, Vec<String>>> {
    let mut photos: HashMap<String, Vec<String>> = HashMap::new();
    if mls_numbers.is_empty() {
        return Ok(photos);
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT mlsNumber, photoUrl FROM photo
         WHERE mlsNumber IN ({}) ORDER BY mlsNumber, position",
        placeholders(mls_numbers.len())
    ))?;
    let rows = stmt.query_map(params_from_iter(mls_numbers.iter()), |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    for row in rows {
        let (mls_number, url) = row?;
        photos.entry(mls_number).or_default().push(url);
    }
    Ok(photos)
}

fn load_price_history(
    conn: &Connection,
    mls_numbers: &[&str],
) -> StorageResult<HashMap<String, Vec<PriceSample>>> {
    let mut prices: HashMap<String, Vec<PriceSample>> = HashMap::new();
    if mls_numbers.is_empty() {
        return Ok(prices);
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT mlsNumber, price, priceTimestamp FROM priceHistory
         WHERE mlsNumber IN ({}) ORDER BY rowid",
        placeholders(mls_numbers.len())
    ))?;
    let rows = stmt.query_map(params_from_iter(mls_numbers.iter()), |row| {
        Ok((
            row.get::<_, String>(0)?,
            PriceSample {
                price: row.get(1)?,
                timestamp: row.get(2)?,
            },
        ))
    })?;

    for row in rows {
        let (mls_number, sample) = row?;
        prices.entry(mls_number).or_default().push(sample);
    }
    Ok(prices)
}

fn encode_parking(parking: &[String]) -> StorageResult<String> {
    serde_json::to_string(parking).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn decode_parking(raw: Option<&str>) -> StorageResult<Vec<String>> {
    match raw {
        Some(raw) if !raw.is_empty() => {
            serde_json::from_str(raw).map_err(|e| StorageError::Serialization(e.to_string()))
        }
        _ => Ok(Vec::new()),
    }
}

fn listing_exists(conn: &Connection, mls_number: &str) -> StorageResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM mls WHERE mlsNumber = ?1",
            params![mls_number],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Checks for a city; `name` and `state` compare case-insensitively
fn city_exists(conn: &Connection, name: &str, state: &str) -> StorageResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM city WHERE name = ?1 AND state = ?2",
            params![name, state],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn insert_city(conn: &Connection, name: &str, state: &str) -> StorageResult<()> {
    conn.execute(
        "INSERT INTO city (name, state) VALUES (?1, ?2)",
        params![name, state],
    )?;
    Ok(())
}

/// Inserts the property row; an address already recorded is left untouched
fn insert_property(conn: &Connection, listing: &Listing) -> StorageResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO property (address, zipcode, latitude, longitude, city, state)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            listing.address,
            listing.zipcode,
            listing.latitude,
            listing.longitude,
            listing.city,
            listing.state
        ],
    )?;
    Ok(())
}

fn insert_mls(conn: &Connection, listing: &Listing) -> StorageResult<()> {
    conn.execute(
        "INSERT INTO mls (
             mlsNumber, mlsId, mlsUrl, bathrooms, bedrooms, landSize, parking,
             publicRemark, stories, propertyType, availableTimestamp, statusId, source, address,
             zipcode, latitude, longitude, city, state)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
        params![
            listing.mls_number,
            listing.mls_id,
            listing.mls_url,
            listing.bathrooms,
            listing.bedrooms,
            listing.land_size,
            encode_parking(&listing.parking)?,
            listing.public_remarks,
            listing.stories,
            listing.property_type,
            listing.list_timestamp,
            ListingStatus::Open.id(),
            listing.source,
            listing.address,
            listing.zipcode,
            listing.latitude,
            listing.longitude,
            listing.city,
            listing.state
        ],
    )?;
    Ok(())
}

/// Inserts one row per photo, keeping the listing's photo order
fn insert_photos(conn: &Connection, listing: &Listing) -> StorageResult<()> {
    let mut stmt =
        conn.prepare("INSERT INTO photo (mlsNumber, position, photoUrl) VALUES (?1, ?2, ?3)")?;
    for (position, url) in listing.photo_urls.iter().enumerate() {
        stmt.execute(params![listing.mls_number, position as i64, url])?;
    }
    Ok(())
}

fn insert_price_history(
    conn: &Connection,
    mls_number: &str,
    samples: &[PriceSample],
) -> StorageResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO priceHistory (mlsNumber, price, priceTimestamp) VALUES (?1, ?2, ?3)",
    )?;
    for sample in samples {
        stmt.execute(params![mls_number, sample.price, sample.timestamp])?;
    }
    Ok(())
}
