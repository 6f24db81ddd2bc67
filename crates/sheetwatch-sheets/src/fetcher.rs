//! Cell fetcher: one cell, normalized, with change detection and retry.
//!
//! The fetcher keeps the value of the previous successful fetch and is the
//! only place that decides whether a reading is new.

use async_trait::async_trait;
use sheetwatch_core::error::Result;
use sheetwatch_core::traits::{CellSource, SheetsApi};
use sheetwatch_core::types::CellReading;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Error reported when the range holds no rows.
pub const NO_DATA: &str = "No data found in cell";

/// How failed fetches are retried.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first (0 is treated as 1).
    pub max_retries: u32,
    /// Pause between attempts.
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(5),
        }
    }
}

pub struct CellFetcher {
    api: Arc<dyn SheetsApi>,
    spreadsheet_id: String,
    range: String,
    policy: RetryPolicy,
    /// Value from the previous successful fetch; `None` until the first one.
    last_value: Mutex<Option<String>>,
}

impl CellFetcher {
    pub fn new(api: Arc<dyn SheetsApi>, spreadsheet_id: &str, range: &str) -> Self {
        Self {
            api,
            spreadsheet_id: spreadsheet_id.to_string(),
            range: range.to_string(),
            policy: RetryPolicy::default(),
            last_value: Mutex::new(None),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch the cell once. Failures are returned inside the reading.
    pub async fn fetch(&self) -> CellReading {
        let rows = match self.api.get_values(&self.spreadsheet_id, &self.range).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!("Error fetching cell value: {e}");
                return CellReading::failed(e.to_string());
            }
        };

        if rows.is_empty() {
            return CellReading::failed(NO_DATA);
        }

        let value = rows
            .first()
            .and_then(|row| row.first())
            .map(normalize)
            .unwrap_or_default();

        let mut last = self.last_value.lock().await;
        let is_new = last.as_deref() != Some(value.as_str());
        *last = Some(value.clone());
        drop(last);

        if is_new {
            tracing::debug!("Cell value changed: '{value}'");
        }
        CellReading::ok(value, is_new)
    }

    /// Fetch, retrying while the reading carries an error. Returns the last
    /// attempt's reading.
    pub async fn fetch_with_retry(&self, policy: &RetryPolicy) -> CellReading {
        let attempts = policy.max_retries.max(1);
        let mut attempt = 1;
        loop {
            let reading = self.fetch().await;
            let Some(err) = reading.error() else {
                return reading;
            };
            if attempt >= attempts {
                if attempts > 1 {
                    tracing::error!("Failed after {attempts} retries: {err}");
                }
                return reading;
            }
            tracing::warn!("Retry {attempt}/{attempts} after error: {err}");
            tokio::time::sleep(policy.retry_delay).await;
            attempt += 1;
        }
    }
}

#[async_trait]
impl CellSource for CellFetcher {
    async fn read_cell(&self) -> Result<CellReading> {
        Ok(self.fetch_with_retry(&self.policy).await)
    }
}

/// Coerce a cell to text and uppercase it.
fn normalize(cell: &serde_json::Value) -> String {
    match cell {
        serde_json::Value::String(s) => s.to_uppercase(),
        serde_json::Value::Null => String::new(),
        other => other.to_string().to_uppercase(),
    }
}
