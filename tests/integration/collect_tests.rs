use listing_indexer::collector::{Collector, CollectorRegistry, MlsCollector};
use listing_indexer::config::{
    CityConfig, SearchConfig, SourceConfig, StorageBackend, StorageConfig,
};
use listing_indexer::storage::{open_storage, MemoryStore, SqliteStore, Storage};
use listing_indexer::{CityEntry, IndexerError, ListingStatus};
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH_PATH: &str = "/Listing.svc/PropertySearch_Post";

const SEARCH_RESPONSE: &str = r#"{
  "ErrorCode": { "Id": 200, "Description": "Success" },
  "Paging": { "RecordsPerPage": 2, "CurrentPage": 1, "TotalRecords": 2 },
  "Results": [
    {
      "Id": "20552312",
      "MlsNumber": "19016318",
      "PublicRemarks": "HOUSE DESCRIPTION",
      "Building": {
        "BathroomTotal": "1",
        "Bedrooms": "3 + 0",
        "StoriesTotal": "1.5",
        "Type": "House"
      },
      "Property": {
        "Price": "$10,000",
        "Type": "Single Family",
        "Address": {
          "AddressText": "1234 street|city, province A0B1C2",
          "Longitude": "-12.345678",
          "Latitude": "98.765432"
        },
        "Photo": [{
          "SequenceId": "1",
          "HighResPath": "https:\/\/picture\/listings\/high\/456.jpg",
          "MedResPath": "https:\/\/picture\/listings\/med\/456.jpg",
          "LowResPath": "https:\/\/picture\/listings\/low\/456.jpg"
        }],
        "Parking": [{ "Name": "None" }]
      },
      "Land": { "SizeTotal": "0X" },
      "PostalCode": "A0B1C2",
      "RelativeDetailsURL": "\/abc.com\/20552312\/house",
      "RelativeURLEn": "\/abc.com\/20552312\/house"
    },
    {
      "Id": "20552400",
      "MlsNumber": "19016400",
      "Building": { "Type": "" },
      "Property": {
        "Price": "$249,900",
        "Type": "Single Family",
        "Address": {
          "AddressText": "99 Riverside Dr|Windsor, Ontario N9A1A1",
          "Longitude": "-83.0364",
          "Latitude": "42.3149"
        },
        "Parking": [{ "Name": "Attached Garage" }, { "Name": "" }]
      },
      "RelativeURLEn": "\/abc.com\/20552400\/house"
    }
  ]
}"#;

fn source_config(server: &MockServer) -> SourceConfig {
    SourceConfig {
        name: "mls-canada".to_string(),
        endpoint: format!("{}{}", server.uri(), SEARCH_PATH),
        request_timeout_secs: 5,
    }
}

async fn mount_search(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .and(body_string_contains("CultureId=1"))
        .respond_with(response)
        .mount(server)
        .await;
}

fn collector(server: &MockServer, storage: Arc<dyn Storage>) -> MlsCollector {
    MlsCollector::new(&source_config(server), SearchConfig::default(), storage)
        .expect("Failed to build collector")
}

#[tokio::test]
async fn test_collect_into_memory_store() {
    let server = MockServer::start().await;
    mount_search(
        &server,
        ResponseTemplate::new(200).set_body_string(SEARCH_RESPONSE),
    )
    .await;

    let storage: Arc<dyn Storage> = Arc::new(MemoryStore::with_city_index([CityEntry::new(
        "City", "Province",
    )]));
    let report = collector(&server, Arc::clone(&storage))
        .collect()
        .await
        .expect("Collection failed");

    assert_eq!(report.received, 2);
    assert_eq!(report.saved, 2);
    assert_eq!(report.failed, 0);

    let listing = storage
        .read_listing("19016318")
        .unwrap()
        .expect("Listing should be stored");
    assert_eq!(listing.mls_id, "20552312");
    assert_eq!(listing.mls_url, "/abc.com/20552312/house");
    assert_eq!(listing.property_type, "House");
    assert_eq!(listing.city, "city");
    assert_eq!(listing.state, "province");
    assert_eq!(listing.zipcode, "A0B1C2");
    assert_eq!(listing.parking, vec!["None".to_string()]);
    assert_eq!(
        listing.photo_urls,
        vec!["https://picture/listings/high/456.jpg".to_string()]
    );
    assert_eq!(listing.source, "mls-canada");
    assert_eq!(listing.status, ListingStatus::Open);
    assert_eq!(listing.price_history.len(), 1);
    assert_eq!(listing.price_history[0].price, 10000);

    // The seeded entry picks up the listing despite the casing difference
    let cities = storage.read_city_index().unwrap();
    let seeded = cities
        .iter()
        .find(|c| c.key() == "city,province")
        .expect("Seeded city should remain");
    assert_eq!(seeded.name, "City");
    assert!(seeded.mls_numbers.contains("19016318"));
    assert!(cities.iter().any(|c| c.key() == "windsor,ontario"));
}

#[tokio::test]
async fn test_collect_into_sqlite_twice_appends_prices() {
    let server = MockServer::start().await;
    mount_search(
        &server,
        ResponseTemplate::new(200).set_body_string(SEARCH_RESPONSE),
    )
    .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("realtor.db");

    {
        let storage: Arc<dyn Storage> =
            Arc::new(SqliteStore::new(&db_path, 1).expect("Failed to open database"));
        let mls = collector(&server, storage);

        let first = mls.collect().await.expect("First collection failed");
        assert_eq!(first.saved, 2);

        let second = mls.collect().await.expect("Second collection failed");
        assert_eq!(second.saved, 0);
        assert_eq!(second.updated, 2);
    }

    // Reopen the file and read everything back with one-row pages
    let reopened = SqliteStore::new(&db_path, 1).expect("Failed to reopen database");
    let listings = reopened.read_listings().unwrap();
    assert_eq!(listings.len(), 2);
    assert!(listings.iter().all(|l| l.price_history.len() == 2));

    let garage = reopened.read_listing("19016400").unwrap().unwrap();
    assert_eq!(garage.property_type, "Single Family");
    assert_eq!(
        garage.parking,
        vec!["Attached Garage".to_string(), String::new()]
    );
    assert_eq!(garage.price_history[0].price, 249900);
    assert!(garage.photo_urls.is_empty());
}

#[tokio::test]
async fn test_malformed_payload_stores_nothing() {
    let server = MockServer::start().await;
    mount_search(
        &server,
        ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"),
    )
    .await;

    let storage: Arc<dyn Storage> = Arc::new(MemoryStore::new());
    let result = collector(&server, Arc::clone(&storage)).collect().await;

    assert!(matches!(result, Err(IndexerError::Normalize(_))));
    assert!(storage.read_listings().unwrap().is_empty());
}

#[tokio::test]
async fn test_server_error_is_reported() {
    let server = MockServer::start().await;
    mount_search(&server, ResponseTemplate::new(500)).await;

    let storage: Arc<dyn Storage> = Arc::new(MemoryStore::new());
    let result = collector(&server, storage).collect().await;

    assert!(matches!(
        result,
        Err(IndexerError::HttpStatus { status: 500, .. })
    ));
}

#[tokio::test]
async fn test_registry_runs_configured_collector() {
    let server = MockServer::start().await;
    mount_search(
        &server,
        ResponseTemplate::new(200).set_body_string(SEARCH_RESPONSE),
    )
    .await;

    let storage_config = StorageConfig {
        backend: StorageBackend::Memory,
        database_path: String::new(),
        read_page_size: 10,
    };
    let cities = vec![CityConfig {
        name: "Windsor".to_string(),
        state: "Ontario".to_string(),
    }];
    let storage = open_storage(&storage_config, &cities).expect("Failed to open storage");

    let mut registry = CollectorRegistry::new();
    registry
        .register(Box::new(collector(&server, Arc::clone(&storage))))
        .unwrap();
    assert!(matches!(
        registry.register(Box::new(collector(&server, Arc::clone(&storage)))),
        Err(IndexerError::CollectorExists(_))
    ));

    let outcomes = registry.run_all().await;
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].name, "mls-canada");
    assert_eq!(outcomes[0].result.as_ref().unwrap().saved, 2);

    let windsor = storage
        .read_city_index()
        .unwrap()
        .into_iter()
        .find(|c| c.key() == "windsor,ontario")
        .unwrap();
    assert_eq!(windsor.mls_numbers.len(), 1);
}
