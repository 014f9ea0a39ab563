//! Google Sheets API v4 backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::auth::TokenProvider;
use crate::credentials::ServiceAccountKey;
use crate::error::SheetsError;
use crate::range::A1Range;
use crate::store::{Row, SheetStore, ValueRange};

/// Public endpoint of the Sheets REST API.
pub const DEFAULT_API_BASE_URL: &str = "https://sheets.googleapis.com/v4/";

/// How written values are interpreted by the service.
const VALUE_INPUT_OPTION: &str = "RAW";

/// A [`SheetStore`] backed by one Google spreadsheet.
#[derive(Debug, Clone)]
pub struct GoogleSheetsStore {
    http: Client,
    base_url: Url,
    spreadsheet_id: String,
    tokens: Arc<TokenProvider>,
    timeout: Option<Duration>,
}

/// Builder for [`GoogleSheetsStore`].
#[derive(Debug)]
pub struct GoogleSheetsStoreBuilder {
    spreadsheet_id: String,
    key: ServiceAccountKey,
    base_url: String,
    timeout: Option<Duration>,
    http: Option<Client>,
}

impl GoogleSheetsStoreBuilder {
    /// Points the client at another API root (used by tests and proxies).
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets a per-request timeout, applied to API calls and token exchanges.
    /// Requests have no timeout by default.
    #[must_use]
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn http_client(mut self, http: Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn build(self) -> Result<GoogleSheetsStore, SheetsError> {
        if self.spreadsheet_id.trim().is_empty() {
            return Err(SheetsError::credentials("spreadsheet id must not be empty"));
        }
        let base_url = Url::parse(&self.base_url).map_err(|e| {
            SheetsError::invalid_range(format!("invalid API base URL '{}': {e}", self.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(SheetsError::invalid_range(format!(
                "API base URL '{}' cannot carry a path",
                self.base_url
            )));
        }

        let http = self.http.unwrap_or_default();
        Ok(GoogleSheetsStore {
            tokens: Arc::new(
                TokenProvider::new(self.key, http.clone()).with_timeout(self.timeout),
            ),
            http,
            base_url,
            spreadsheet_id: self.spreadsheet_id,
            timeout: self.timeout,
        })
    }
}

impl GoogleSheetsStore {
    pub fn builder(
        spreadsheet_id: impl Into<String>,
        key: ServiceAccountKey,
    ) -> GoogleSheetsStoreBuilder {
        GoogleSheetsStoreBuilder {
            spreadsheet_id: spreadsheet_id.into(),
            key,
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: None,
            http: None,
        }
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// `{base}/spreadsheets/{id}/values/{range}{suffix}` with the range
    /// percent-encoded as one path segment.
    fn values_url(&self, range: &A1Range, suffix: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push("spreadsheets")
                .push(&self.spreadsheet_id)
                .push("values")
                .push(&format!("{range}{suffix}"));
        }
        url
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Value, SheetsError> {
        let token = self.tokens.access_token().await?;
        let mut request = request.bearer_auth(token);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = api_error_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            if status == reqwest::StatusCode::UNAUTHORIZED {
                self.tokens.invalidate().await;
            }
            warn!(status = %status, error = %message, "Sheets API call failed");
            return Err(SheetsError::api(status.as_u16(), message));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SheetsError::decode(e.to_string()))
    }

    fn write_request(&self, method: Method, url: Url, rows: &[Row]) -> RequestBuilder {
        self.http
            .request(method, url)
            .query(&[("valueInputOption", VALUE_INPUT_OPTION)])
            .json(&json!({ "values": rows }))
    }
}

/// Extracts `error.message` from a Google API error body.
fn api_error_message(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    parsed
        .pointer("/error/message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[async_trait]
impl SheetStore for GoogleSheetsStore {
    fn backend_name(&self) -> &'static str {
        "google"
    }

    #[instrument(skip_all, fields(range = %range, rows = rows.len()))]
    async fn append_rows(&self, range: &A1Range, rows: &[Row]) -> Result<Value, SheetsError> {
        let url = self.values_url(range, ":append");
        let result = self
            .execute(self.write_request(Method::POST, url, rows))
            .await?;
        debug!("Rows appended");
        Ok(result)
    }

    #[instrument(skip_all, fields(range = %range))]
    async fn read_rows(&self, range: &A1Range) -> Result<Vec<Row>, SheetsError> {
        let url = self.values_url(range, "");
        let body = self.execute(self.http.get(url)).await?;
        let value_range: ValueRange =
            serde_json::from_value(body).map_err(|e| SheetsError::decode(e.to_string()))?;
        debug!(rows = value_range.values.len(), "Rows read");
        Ok(value_range.values)
    }

    #[instrument(skip_all, fields(range = %range, rows = rows.len()))]
    async fn update_rows(&self, range: &A1Range, rows: &[Row]) -> Result<Value, SheetsError> {
        let url = self.values_url(range, "");
        let result = self
            .execute(self.write_request(Method::PUT, url, rows))
            .await?;
        debug!("Rows updated");
        Ok(result)
    }
}
