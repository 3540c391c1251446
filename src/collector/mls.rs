//! MLS listing collector
//!
//! Fetches one search page from the MLS endpoint, normalizes it, and stores
//! the result. Listings already stored get a new price sample instead.

use crate::collector::fetcher::{build_http_client, fetch_payload};
use crate::collector::{CollectionReport, Collector};
use crate::config::{SearchConfig, SourceConfig};
use crate::listing::Listing;
use crate::normalize::normalize;
use crate::storage::{Storage, StorageError};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;

/// Collector for an MLS search endpoint
pub struct MlsCollector {
    name: String,
    endpoint: String,
    search: SearchConfig,
    client: Client,
    storage: Arc<dyn Storage>,
}

impl MlsCollector {
    /// Creates a collector writing into `storage`
    pub fn new(
        source: &SourceConfig,
        search: SearchConfig,
        storage: Arc<dyn Storage>,
    ) -> crate::Result<Self> {
        Ok(Self {
            name: source.name.clone(),
            endpoint: source.endpoint.clone(),
            search,
            client: build_http_client(source)?,
            storage,
        })
    }
}

#[async_trait]
impl Collector for MlsCollector {
    fn name(&self) -> &str {
        &self.name
    }

    fn storage(&self) -> Arc<dyn Storage> {
        Arc::clone(&self.storage)
    }

    async fn collect(&self) -> crate::Result<CollectionReport> {
        let body = fetch_payload(&self.client, &self.endpoint, &self.search).await?;
        let listings = normalize(&body, &self.name)?;

        tracing::info!(
            "Collector '{}' received {} listing(s)",
            self.name,
            listings.len()
        );

        Ok(store_listings(self.storage.as_ref(), listings.values()))
    }
}

/// Saves each listing, recording a price sample for listings already stored
///
/// Failures are counted per listing and never abort the batch.
pub fn store_listings<'a>(
    storage: &dyn Storage,
    listings: impl IntoIterator<Item = &'a Listing>,
) -> CollectionReport {
    let mut report = CollectionReport::default();

    for listing in listings {
        report.received += 1;

        match storage.save_new_listing(listing) {
            Ok(()) => report.saved += 1,
            Err(StorageError::AlreadyExists(_)) => {
                tracing::debug!(
                    "Listing {} already stored, recording price",
                    listing.mls_number
                );
                match storage.update_listing(listing) {
                    Ok(()) => report.updated += 1,
                    Err(e) => {
                        tracing::warn!("Failed to update listing {}: {}", listing.mls_number, e);
                        report.failed += 1;
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Failed to save listing {}: {}", listing.mls_number, e);
                report.failed += 1;
            }
        }
    }

    report
}
