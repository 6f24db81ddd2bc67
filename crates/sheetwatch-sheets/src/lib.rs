//! # SheetWatch Sheets
//!
//! Reads the watched cell from Google Sheets.
//!
//! - [`GoogleSheetsClient`] talks to the Sheets v4 REST API with an API key.
//! - [`CellFetcher`] normalizes the cell text, tracks whether it changed since
//!   the previous successful fetch, and retries failed fetches.

pub mod client;
pub mod fetcher;

pub use client::GoogleSheetsClient;
pub use fetcher::{CellFetcher, RetryPolicy};

use sheetwatch_core::SheetWatchConfig;
use sheetwatch_core::error::{Result, SheetWatchError};
use std::sync::Arc;

/// Build the production fetcher from configuration.
///
/// Refuses to construct without an API key.
pub fn create_fetcher(config: &SheetWatchConfig) -> Result<CellFetcher> {
    let api_key = config
        .api_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or(SheetWatchError::MissingApiKey)?;

    let client = GoogleSheetsClient::new(api_key, &config.sheets_base_url);
    let policy = RetryPolicy {
        max_retries: config.max_retries,
        retry_delay: config.retry_delay(),
    };
    Ok(CellFetcher::new(
        Arc::new(client),
        &config.spreadsheet_id,
        &config.range_name,
    )
    .with_policy(policy))
}
