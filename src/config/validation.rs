use crate::config::types::{
    CityConfig, Config, ScheduleConfig, SearchConfig, SourceConfig, StorageBackend, StorageConfig,
};
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_source_config(&config.source)?;
    validate_search_config(&config.search)?;
    validate_storage_config(&config.storage)?;
    validate_schedule_config(&config.schedule)?;
    validate_cities(&config.cities)?;
    Ok(())
}

/// Validates the listing source
fn validate_source_config(config: &SourceConfig) -> ConfigResult<()> {
    if config.name.is_empty() {
        return Err(ConfigError::Validation(
            "source name cannot be empty".to_string(),
        ));
    }

    let url = Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid endpoint: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Endpoint must be http or https: {}",
            config.endpoint
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the search bounding box and paging parameters
fn validate_search_config(config: &SearchConfig) -> ConfigResult<()> {
    validate_range("latitude", config.latitude_min, config.latitude_max, 90.0)?;
    validate_range("longitude", config.longitude_min, config.longitude_max, 180.0)?;

    if config.records_per_page < 1 || config.records_per_page > 200 {
        return Err(ConfigError::Validation(format!(
            "records_per_page must be between 1 and 200, got {}",
            config.records_per_page
        )));
    }

    if config.zoom_level < 1 || config.zoom_level > 20 {
        return Err(ConfigError::Validation(format!(
            "zoom_level must be between 1 and 20, got {}",
            config.zoom_level
        )));
    }

    Ok(())
}

fn validate_range(axis: &str, min: f64, max: f64, bound: f64) -> ConfigResult<()> {
    for value in [min, max] {
        if !(-bound..=bound).contains(&value) {
            return Err(ConfigError::Validation(format!(
                "{} must be within [-{}, {}], got {}",
                axis, bound, bound, value
            )));
        }
    }

    if min >= max {
        return Err(ConfigError::Validation(format!(
            "{} minimum ({}) must be below maximum ({})",
            axis, min, max
        )));
    }

    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> ConfigResult<()> {
    if config.backend == StorageBackend::Sqlite && config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty for the sqlite backend".to_string(),
        ));
    }

    if config.read_page_size < 1 {
        return Err(ConfigError::Validation(
            "read_page_size must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_schedule_config(config: &ScheduleConfig) -> ConfigResult<()> {
    if config.interval_hours < 1 {
        return Err(ConfigError::Validation(
            "interval_hours must be >= 1".to_string(),
        ));
    }
    Ok(())
}

fn validate_cities(cities: &[CityConfig]) -> ConfigResult<()> {
    for city in cities {
        if city.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Seeded city in '{}' must have a name",
                city.state
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_range() {
        assert!(validate_range("latitude", 41.99, 42.36, 90.0).is_ok());
        assert!(validate_range("longitude", -83.12, -82.47, 180.0).is_ok());

        assert!(validate_range("latitude", 42.36, 41.99, 90.0).is_err());
        assert!(validate_range("latitude", 10.0, 10.0, 90.0).is_err());
        assert!(validate_range("latitude", -91.0, 10.0, 90.0).is_err());
        assert!(validate_range("longitude", 0.0, 181.0, 180.0).is_err());
    }

    #[test]
    fn test_default_search_is_valid() {
        assert!(validate_search_config(&SearchConfig::default()).is_ok());
    }

    #[test]
    fn test_records_per_page_bounds() {
        let mut search = SearchConfig::default();
        search.records_per_page = 0;
        assert!(validate_search_config(&search).is_err());

        search.records_per_page = 201;
        assert!(validate_search_config(&search).is_err());

        search.records_per_page = 200;
        assert!(validate_search_config(&search).is_ok());
    }

    #[test]
    fn test_source_endpoint_scheme() {
        let mut source = SourceConfig {
            name: "mls-canada".to_string(),
            endpoint: "https://api.example.com/search".to_string(),
            request_timeout_secs: 30,
        };
        assert!(validate_source_config(&source).is_ok());

        source.endpoint = "ftp://api.example.com/search".to_string();
        assert!(matches!(
            validate_source_config(&source),
            Err(ConfigError::InvalidUrl(_))
        ));

        source.endpoint = "not a url".to_string();
        assert!(validate_source_config(&source).is_err());
    }

    #[test]
    fn test_sqlite_requires_path() {
        let mut storage = StorageConfig {
            backend: StorageBackend::Sqlite,
            database_path: String::new(),
            read_page_size: 10,
        };
        assert!(validate_storage_config(&storage).is_err());

        storage.backend = StorageBackend::Memory;
        assert!(validate_storage_config(&storage).is_ok());
    }

    #[test]
    fn test_cities_need_names() {
        let cities = vec![CityConfig {
            name: " ".to_string(),
            state: "Ontario".to_string(),
        }];
        assert!(validate_cities(&cities).is_err());
    }
}
