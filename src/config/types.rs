use serde::Deserialize;

/// Main configuration structure for the listing indexer
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub search: SearchConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default, rename = "city")]
    pub cities: Vec<CityConfig>,
}

/// Listing source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Collector name, also stamped on every listing as its source
    #[serde(default = "default_source_name")]
    pub name: String,

    /// Search endpoint receiving the form POST
    pub endpoint: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Search parameters sent with every fetch
///
/// Defaults describe the Windsor, Ontario residential-for-sale search.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    #[serde(rename = "zoom-level")]
    pub zoom_level: u32,

    #[serde(rename = "latitude-min")]
    pub latitude_min: f64,

    #[serde(rename = "latitude-max")]
    pub latitude_max: f64,

    #[serde(rename = "longitude-min")]
    pub longitude_min: f64,

    #[serde(rename = "longitude-max")]
    pub longitude_max: f64,

    #[serde(rename = "current-page")]
    pub current_page: u32,

    pub sort: String,

    #[serde(rename = "records-per-page")]
    pub records_per_page: u32,

    #[serde(rename = "property-type-group-id")]
    pub property_type_group_id: u32,

    #[serde(rename = "property-search-type-id")]
    pub property_search_type_id: u32,

    #[serde(rename = "transaction-type-id")]
    pub transaction_type_id: u32,

    #[serde(rename = "application-id")]
    pub application_id: u32,

    #[serde(rename = "culture-id")]
    pub culture_id: u32,

    pub version: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            zoom_level: 11,
            latitude_min: 41.9947561,
            latitude_max: 42.3661983,
            longitude_min: -83.1245969,
            longitude_max: -82.4784635,
            current_page: 1,
            sort: "6-D".to_string(),
            records_per_page: 20,
            property_type_group_id: 1,
            property_search_type_id: 1,
            transaction_type_id: 2,
            application_id: 1,
            culture_id: 1,
            version: "7.0".to_string(),
        }
    }
}

impl SearchConfig {
    /// Form fields of the search POST, in the order the source documents them
    pub fn to_form(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ZoomLevel", self.zoom_level.to_string()),
            ("LatitudeMax", self.latitude_max.to_string()),
            ("LongitudeMax", self.longitude_max.to_string()),
            ("LatitudeMin", self.latitude_min.to_string()),
            ("LongitudeMin", self.longitude_min.to_string()),
            ("CurrentPage", self.current_page.to_string()),
            ("Sort", self.sort.clone()),
            ("RecordsPerPage", self.records_per_page.to_string()),
            ("PropertyTypeGroupID", self.property_type_group_id.to_string()),
            ("PropertySearchTypeId", self.property_search_type_id.to_string()),
            ("TransactionTypeId", self.transaction_type_id.to_string()),
            ("ApplicationId", self.application_id.to_string()),
            ("CultureId", self.culture_id.to_string()),
            ("Version", self.version.clone()),
        ]
    }
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Sqlite,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// Path to the SQLite database file
    #[serde(rename = "database-path", default)]
    pub database_path: String,

    /// Listings per query when reading everything back from SQLite
    #[serde(rename = "read-page-size", default = "default_read_page_size")]
    pub read_page_size: usize,
}

/// Collection schedule
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    #[serde(rename = "interval-hours", default = "default_interval_hours")]
    pub interval_hours: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_hours: default_interval_hours(),
        }
    }
}

/// City index seed entry
#[derive(Debug, Clone, Deserialize)]
pub struct CityConfig {
    pub name: String,
    pub state: String,
}

fn default_source_name() -> String {
    crate::normalize::DEFAULT_SOURCE.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_read_page_size() -> usize {
    crate::storage::DEFAULT_PAGE_SIZE
}

fn default_interval_hours() -> u64 {
    24
}
