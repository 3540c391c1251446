//! Periodic collection loop

use crate::collector::CollectorRegistry;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Runs every registered collector now and then once per `interval`
///
/// Stops after `max_cycles` cycles when given, or when Ctrl-C is received
/// between cycles. Returns the number of cycles run.
pub async fn run_schedule(
    registry: &CollectorRegistry,
    interval: Duration,
    max_cycles: Option<usize>,
) -> usize {
    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut cycles = 0;
    loop {
        if max_cycles.is_some_and(|max| cycles >= max) {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping collection loop");
                break;
            }
        }

        cycles += 1;
        tracing::info!("Starting collection cycle {}", cycles);
        run_cycle(registry).await;
    }

    tracing::info!("Collection loop finished after {} cycle(s)", cycles);
    cycles
}

async fn run_cycle(registry: &CollectorRegistry) {
    for outcome in registry.run_all().await {
        let Some(collector) = registry.get(&outcome.name) else {
            continue;
        };

        match collector.storage().read_listings() {
            Ok(listings) => tracing::info!(
                "Collector '{}' now holds {} listing(s)",
                outcome.name,
                listings.len()
            ),
            Err(e) => tracing::error!(
                "Reading listings of collector '{}' failed: {}",
                outcome.name,
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{store_listings, CollectionReport, Collector};
    use crate::listing::{Listing, PriceSample};
    use crate::storage::{MemoryStore, Storage};
    use crate::IndexerError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    /// Reports the same listing every run with an increasing timestamp
    struct RepeatingCollector {
        runs: AtomicI64,
        storage: Arc<dyn Storage>,
    }

    #[async_trait]
    impl Collector for RepeatingCollector {
        fn name(&self) -> &str {
            "repeating"
        }

        fn storage(&self) -> Arc<dyn Storage> {
            Arc::clone(&self.storage)
        }

        async fn collect(&self) -> Result<CollectionReport, IndexerError> {
            let run = self.runs.fetch_add(1, Ordering::SeqCst);
            let listing = Listing {
                mls_number: "19016318".to_string(),
                price_history: vec![PriceSample {
                    price: 10000,
                    timestamp: run,
                }],
                ..Default::default()
            };
            Ok(store_listings(self.storage.as_ref(), [&listing]))
        }
    }

    #[tokio::test]
    async fn test_runs_requested_cycles() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStore::new());
        let mut registry = CollectorRegistry::new();
        registry
            .register(Box::new(RepeatingCollector {
                runs: AtomicI64::new(0),
                storage: Arc::clone(&storage),
            }))
            .unwrap();

        let cycles = run_schedule(&registry, Duration::from_millis(5), Some(3)).await;
        assert_eq!(cycles, 3);

        let stored = storage.read_listing("19016318").unwrap().unwrap();
        let timestamps: Vec<i64> = stored.price_history.iter().map(|p| p.timestamp).collect();
        assert_eq!(timestamps, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_zero_cycles_runs_nothing() {
        let registry = CollectorRegistry::new();
        let cycles = run_schedule(&registry, Duration::from_secs(3600), Some(0)).await;
        assert_eq!(cycles, 0);
    }
}
