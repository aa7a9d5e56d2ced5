//! Spreadsheet provider boundary.
//!
//! [`SheetProvider`] is the seam the refresh cache depends on; the real
//! implementation talks to the Google Sheets v4 values API for rows and to
//! the Drive v3 metadata API for the modification timestamp that serves as
//! the version token. Tests stub the trait or point the client at a local
//! mock server.

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::config;
use crate::error::ProviderError;

/// Read access to the remote tabular data source.
#[async_trait]
pub trait SheetProvider: Send + Sync {
    /// Cheap metadata call: an opaque token that changes whenever the
    /// source data changes.
    async fn version_token(&self) -> Result<String, ProviderError>;

    /// Bulk data call: all rows of the configured range, in sheet order.
    async fn fetch_rows(&self) -> Result<Vec<Vec<String>>, ProviderError>;
}

/// Google Sheets client over the public REST surface.
pub struct GoogleSheetsClient {
    http: reqwest::Client,
    sheets_base: String,
    drive_base: String,
    sheet_id: String,
    range: String,
    api_key: SecretString,
}

impl GoogleSheetsClient {
    /// Builds a client with the workspace-wide connect and total timeouts.
    pub fn new(sheet_id: String, range: String, api_key: SecretString) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config::network::connect_timeout())
            .timeout(config::network::total_timeout())
            .build()?;

        Ok(Self {
            http,
            sheets_base: "https://sheets.googleapis.com".to_string(),
            drive_base: "https://www.googleapis.com".to_string(),
            sheet_id,
            range,
            api_key,
        })
    }

    /// Overrides both API base URLs. Used by tests to target a mock server.
    #[must_use]
    pub fn with_base_urls(mut self, sheets_base: impl Into<String>, drive_base: impl Into<String>) -> Self {
        self.sheets_base = sheets_base.into();
        self.drive_base = drive_base.into();
        self
    }

    async fn get_json(&self, url: String) -> Result<serde_json::Value, ProviderError> {
        let response = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.expose_secret())])
            .send()
            .await?;
        let response = check_status(response)?;

        response
            .json::<serde_json::Value>()
            .await
            .map_err(ProviderError::Network)
    }
}

#[async_trait]
impl SheetProvider for GoogleSheetsClient {
    async fn version_token(&self) -> Result<String, ProviderError> {
        let url = format!("{}/drive/v3/files/{}?fields=modifiedTime", self.drive_base, self.sheet_id);
        let body = self.get_json(url).await?;

        body.get("modifiedTime")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Malformed("file metadata without modifiedTime".to_string()))
    }

    async fn fetch_rows(&self) -> Result<Vec<Vec<String>>, ProviderError> {
        let url = format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.sheets_base, self.sheet_id, self.range
        );
        let body = self.get_json(url).await?;

        // An empty range comes back without a "values" key at all.
        let values = match body.get("values") {
            None => return Ok(Vec::new()),
            Some(v) => v
                .as_array()
                .ok_or_else(|| ProviderError::Malformed("values is not an array".to_string()))?,
        };

        let mut rows = Vec::with_capacity(values.len());
        for value in values {
            let cells = value
                .as_array()
                .ok_or_else(|| ProviderError::Malformed("row is not an array".to_string()))?;
            rows.push(cells.iter().map(cell_to_string).collect());
        }

        log::debug!("Fetched {} row(s) from range {}", rows.len(), self.range);
        Ok(rows)
    }
}

/// The values API returns formatted strings, but unformatted numbers can
/// leak through depending on sheet settings.
fn cell_to_string(cell: &serde_json::Value) -> String {
    match cell {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn check_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ProviderError::Auth(status)),
        StatusCode::NOT_FOUND => Err(ProviderError::NotFound(format!(
            "{} {}",
            status,
            response.url().path()
        ))),
        StatusCode::TOO_MANY_REQUESTS => {
            let hint = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs);
            Err(ProviderError::RateLimited(hint))
        }
        _ => Err(ProviderError::Http(status)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GoogleSheetsClient {
        GoogleSheetsClient::new(
            "sheet-1".to_string(),
            "Guides!A:C".to_string(),
            SecretString::from("test-key"),
        )
        .unwrap()
        .with_base_urls(server.uri(), server.uri())
    }

    #[tokio::test]
    async fn test_version_token_reads_modified_time() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drive/v3/files/sheet-1"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "modifiedTime": "2026-01-12T10:00:00.000Z"
            })))
            .mount(&server)
            .await;

        let token = client(&server).version_token().await.unwrap();
        assert_eq!(token, "2026-01-12T10:00:00.000Z");
    }

    #[tokio::test]
    async fn test_fetch_rows_parses_values() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/spreadsheets/sheet-1/values/Guides!A:C"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "range": "Guides!A1:C3",
                "values": [["", "Button", "Text"], ["", "Интро", "Привет"], ["Интро", "FAQ", 42]]
            })))
            .mount(&server)
            .await;

        let rows = client(&server).fetch_rows().await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], vec!["", "Интро", "Привет"]);
        assert_eq!(rows[2][2], "42");
    }

    #[tokio::test]
    async fn test_fetch_rows_empty_range() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "range": "Guides!A1:C1" })))
            .mount(&server)
            .await;

        let rows = client(&server).fetch_rows().await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_forbidden_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = client(&server).fetch_rows().await.unwrap_err();
        assert!(matches!(err, ProviderError::Auth(StatusCode::FORBIDDEN)));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_not_found_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client(&server).version_token().await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rate_limit_carries_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let err = client(&server).fetch_rows().await.unwrap_err();
        match err {
            ProviderError::RateLimited(hint) => assert_eq!(hint, Some(Duration::from_secs(7))),
            other => panic!("expected RateLimited, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_tabular_payload_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "values": "oops" })))
            .mount(&server)
            .await;

        let err = client(&server).fetch_rows().await.unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }
}
