//! Capability traits at the seams between crates.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::CellReading;

/// Raw access to a spreadsheet values endpoint.
#[async_trait]
pub trait SheetsApi: Send + Sync {
    /// Fetch the rows of `range` in spreadsheet `spreadsheet_id`.
    /// An empty vector means the range holds no data.
    async fn get_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<serde_json::Value>>>;
}

/// Something the monitor can read the watched cell from.
///
/// Fetch failures are reported inside the [`CellReading`]; an `Err` here
/// means something unexpected went wrong outside the fetch itself.
#[async_trait]
pub trait CellSource: Send + Sync {
    async fn read_cell(&self) -> Result<CellReading>;
}

/// Per-call notification overrides. Unset fields fall back to the
/// notifier's defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyOptions {
    pub title: Option<String>,
    pub priority: Option<String>,
    pub tags: Option<String>,
    pub click_url: Option<String>,
    pub topic: Option<String>,
}

/// A notification delivery channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name, for logs and diagnostics.
    fn name(&self) -> &str;

    /// Deliver `message`. Returns `true` on success; failures are logged
    /// and reported as `false`, never raised.
    async fn send(&self, message: &str, options: &NotifyOptions) -> bool;
}
