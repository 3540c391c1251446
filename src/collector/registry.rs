use crate::collector::{CollectionReport, Collector};
use crate::IndexerError;
use std::collections::BTreeMap;

/// Result of running one collector
#[derive(Debug)]
pub struct CollectorOutcome {
    pub name: String,
    pub result: crate::Result<CollectionReport>,
}

/// Collectors keyed by unique name
#[derive(Default)]
pub struct CollectorRegistry {
    collectors: BTreeMap<String, Box<dyn Collector>>,
}

impl CollectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a collector
    ///
    /// # Errors
    ///
    /// * `CollectorExists` - a collector with the same name is registered
    pub fn register(&mut self, collector: Box<dyn Collector>) -> crate::Result<()> {
        let name = collector.name().to_string();
        if self.collectors.contains_key(&name) {
            return Err(IndexerError::CollectorExists(name));
        }

        tracing::debug!("Registered collector '{}'", name);
        self.collectors.insert(name, collector);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn Collector> {
        self.collectors.get(name).map(|c| c.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.collectors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }

    /// Runs every collector in name order
    ///
    /// A failing collector is logged and reported; the rest still run.
    pub async fn run_all(&self) -> Vec<CollectorOutcome> {
        let mut outcomes = Vec::with_capacity(self.collectors.len());

        for (name, collector) in &self.collectors {
            tracing::info!("Running the '{}' collector", name);

            let result = collector.collect().await;
            match &result {
                Ok(report) => tracing::info!("Collector '{}' finished: {}", name, report),
                Err(e) => tracing::error!("Collector '{}' failed: {}", name, e),
            }

            outcomes.push(CollectorOutcome {
                name: name.clone(),
                result,
            });
        }

        outcomes
    }
}
