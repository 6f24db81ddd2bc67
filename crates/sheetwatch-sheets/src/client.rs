//! Google Sheets v4 REST client (API-key auth, read-only).

use async_trait::async_trait;
use serde::Deserialize;
use sheetwatch_core::error::{Result, SheetWatchError};
use sheetwatch_core::traits::SheetsApi;
use tokio::sync::OnceCell;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// `spreadsheets.values.get` response body. `values` is omitted by the API
/// when the range is empty.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Read-only Sheets client.
///
/// The underlying HTTP client is built on first use and reused for the
/// lifetime of this value.
pub struct GoogleSheetsClient {
    api_key: String,
    base_url: String,
    http: OnceCell<reqwest::Client>,
}

impl GoogleSheetsClient {
    pub fn new(api_key: &str, base_url: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            http: OnceCell::new(),
        }
    }

    async fn http(&self) -> Result<&reqwest::Client> {
        self.http
            .get_or_try_init(|| async {
                let built = reqwest::Client::builder()
                    .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                    .build();
                match built {
                    Ok(client) => {
                        tracing::info!("Connected to Google Sheets API at {}", self.base_url);
                        Ok(client)
                    }
                    Err(e) => {
                        tracing::error!("Failed to build Google Sheets client: {e}");
                        Err(SheetWatchError::Sheets(format!("failed to build client: {e}")))
                    }
                }
            })
            .await
    }

    /// `{base}/v4/spreadsheets/{id}/values/{range}` with the id and range
    /// percent-encoded as single path segments.
    fn values_url(&self, spreadsheet_id: &str, range: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| SheetWatchError::Sheets(format!("invalid base URL {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| SheetWatchError::Sheets(format!("base URL cannot take a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", spreadsheet_id, "values", range]);
        Ok(url)
    }
}

#[async_trait]
impl SheetsApi for GoogleSheetsClient {
    async fn get_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<serde_json::Value>>> {
        let url = self.values_url(spreadsheet_id, range)?;
        let http = self.http().await?;
        let resp = http
            .get(url)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SheetWatchError::Sheets(format!("HTTP {status}: {body}")));
        }

        let range: ValueRange = resp.json().await?;
        Ok(range.values)
    }
}
