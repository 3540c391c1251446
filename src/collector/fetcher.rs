//! HTTP fetcher for the listing search endpoint
//!
//! The search is a single form POST; the response body is returned untouched
//! so normalization stays a pure function of the bytes.

use crate::config::{SearchConfig, SourceConfig};
use crate::IndexerError;
use reqwest::Client;
use std::time::Duration;

const USER_AGENT: &str = concat!("listing-indexer/", env!("CARGO_PKG_VERSION"));

/// Builds an HTTP client for the listing source
///
/// # Arguments
///
/// * `config` - The source configuration (timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &SourceConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Issues the search POST and returns the raw response body
///
/// # Errors
///
/// * `IndexerError::Http` - transport failure or unreadable body
/// * `IndexerError::HttpStatus` - the endpoint answered with a non-2xx status
pub async fn fetch_payload(
    client: &Client,
    endpoint: &str,
    search: &SearchConfig,
) -> crate::Result<Vec<u8>> {
    tracing::debug!("Posting listing search to {}", endpoint);

    let response = client
        .post(endpoint)
        .form(&search.to_form())
        .send()
        .await
        .map_err(|source| IndexerError::Http {
            url: endpoint.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(IndexerError::HttpStatus {
            url: endpoint.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|source| IndexerError::Http {
            url: endpoint.to_string(),
            source,
        })?;

    tracing::debug!("Received {} bytes from {}", body.len(), endpoint);
    Ok(body.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config() -> SourceConfig {
        SourceConfig {
            name: "mls-canada".to_string(),
            endpoint: "http://localhost/search".to_string(),
            request_timeout_secs: 5,
        }
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&create_test_config());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_posts_search_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("ZoomLevel=11"))
            .and(body_string_contains("Sort=6-D"))
            .and(body_string_contains("RecordsPerPage=20"))
            .and(body_string_contains("TransactionTypeId=2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"Results":[]}"#))
            .expect(1)
            .mount(&server)
            .await;

        let client = build_http_client(&create_test_config()).unwrap();
        let body = fetch_payload(&client, &server.uri(), &SearchConfig::default())
            .await
            .unwrap();

        assert_eq!(body, br#"{"Results":[]}"#.to_vec());
    }

    #[tokio::test]
    async fn test_fetch_rejects_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = build_http_client(&create_test_config()).unwrap();
        let result = fetch_payload(&client, &server.uri(), &SearchConfig::default()).await;

        assert!(matches!(
            result,
            Err(IndexerError::HttpStatus { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_reports_transport_failure() {
        let client = build_http_client(&create_test_config()).unwrap();
        // Port 9 (discard) is not listening in test environments
        let result = fetch_payload(&client, "http://127.0.0.1:9/search", &SearchConfig::default())
            .await;

        assert!(matches!(result, Err(IndexerError::Http { .. })));
    }
}
