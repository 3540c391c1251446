//! Database schema definitions
//!
//! This module contains the SQL schema of the relational listing store. Table
//! and column names are the compatibility surface with existing databases.

use crate::listing::ListingStatus;
use rusqlite::params;

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Listing status lookup, seeded from ListingStatus
CREATE TABLE IF NOT EXISTS listingStatus (
    statusId INTEGER PRIMARY KEY,
    status TEXT UNIQUE
);

-- Cities, keyed case-insensitively by name and state
CREATE TABLE IF NOT EXISTS city (
    name TEXT NOT NULL COLLATE NOCASE,
    state TEXT NOT NULL COLLATE NOCASE,
    PRIMARY KEY (name, state)
);

-- Shared by every listing at one address; first-seen values win
CREATE TABLE IF NOT EXISTS property (
    address TEXT PRIMARY KEY,
    zipcode TEXT NOT NULL,
    latitude REAL,
    longitude REAL,
    city TEXT,
    state TEXT,
    FOREIGN KEY(city, state) REFERENCES city(name, state)
);

CREATE TABLE IF NOT EXISTS mls (
    mlsNumber TEXT PRIMARY KEY,
    mlsId TEXT,
    mlsUrl TEXT,
    bathrooms TEXT,
    bedrooms TEXT,
    landSize TEXT,
    parking TEXT,
    publicRemark TEXT,
    stories TEXT,
    propertyType TEXT,
    availableTimestamp INTEGER,
    statusId INTEGER,
    source TEXT,
    address TEXT,
    zipcode TEXT,
    latitude REAL,
    longitude REAL,
    city TEXT,
    state TEXT,
    FOREIGN KEY(statusId) REFERENCES listingStatus(statusId),
    FOREIGN KEY(address) REFERENCES property(address),
    FOREIGN KEY(city, state) REFERENCES city(name, state)
);

CREATE INDEX IF NOT EXISTS idx_mls_city ON mls(city, state);

-- One row per photo, ordered within its listing
CREATE TABLE IF NOT EXISTS photo (
    mlsNumber TEXT NOT NULL,
    position INTEGER NOT NULL,
    photoUrl TEXT NOT NULL,
    PRIMARY KEY (mlsNumber, position),
    FOREIGN KEY(mlsNumber) REFERENCES mls(mlsNumber)
);

-- Append-only price samples
CREATE TABLE IF NOT EXISTS priceHistory (
    mlsNumber TEXT,
    price INTEGER,
    priceTimestamp INTEGER,
    FOREIGN KEY(mlsNumber) REFERENCES mls(mlsNumber)
);

CREATE INDEX IF NOT EXISTS idx_price_history_mls ON priceHistory(mlsNumber);
"#;

/// Initializes the database schema and seeds the status lookup
///
/// Idempotent: tables are created only when missing and existing status rows
/// are left alone.
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;

    let mut stmt =
        conn.prepare("INSERT OR IGNORE INTO listingStatus (statusId, status) VALUES (?1, ?2)")?;
    for status in ListingStatus::all() {
        stmt.execute(params![status.id(), status.name()])?;
    }

    Ok(())
}
