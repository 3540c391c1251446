//! Collector module for gathering listings from their sources
//!
//! This module contains the collection side of the indexer:
//! - The `Collector` trait implemented per listing source
//! - The MLS collector (fetch, normalize, store)
//! - An explicit registry of collectors built at startup
//! - The periodic collection loop

mod fetcher;
mod mls;
mod registry;
mod schedule;

pub use fetcher::{build_http_client, fetch_payload};
pub use mls::{store_listings, MlsCollector};
pub use registry::{CollectorOutcome, CollectorRegistry};
pub use schedule::run_schedule;

use crate::storage::Storage;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Counts from one collection pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionReport {
    /// Listings produced by normalization
    pub received: usize,
    /// Listings stored for the first time
    pub saved: usize,
    /// Listings already stored that got a new price sample
    pub updated: usize,
    /// Listings that could not be stored
    pub failed: usize,
}

impl fmt::Display for CollectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} received, {} saved, {} updated, {} failed",
            self.received, self.saved, self.updated, self.failed
        )
    }
}

/// A listing source that can be collected into storage
#[async_trait]
pub trait Collector: Send + Sync {
    /// Unique name used for registration and as the listing source tag
    fn name(&self) -> &str;

    /// Storage this collector writes into
    fn storage(&self) -> Arc<dyn Storage>;

    /// Fetches the source once and stores what it returned
    async fn collect(&self) -> crate::Result<CollectionReport>;
}
