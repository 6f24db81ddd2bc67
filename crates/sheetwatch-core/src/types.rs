//! Data model shared by the fetcher, monitor, and gateway.

use serde::{Deserialize, Serialize};

/// Timestamp format used for readings and history entries.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time formatted with [`TIMESTAMP_FORMAT`].
pub fn now_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Result of one fetch attempt against the spreadsheet.
///
/// Only built through [`CellReading::ok`] and [`CellReading::failed`], so a
/// reading carrying an error always has an empty value and is never new.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellReading {
    value: String,
    is_new: bool,
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl CellReading {
    /// A successful reading.
    pub fn ok(value: impl Into<String>, is_new: bool) -> Self {
        Self {
            value: value.into(),
            is_new,
            timestamp: now_timestamp(),
            error: None,
        }
    }

    /// A failed reading.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            value: String::new(),
            is_new: false,
            timestamp: now_timestamp(),
            error: Some(error.into()),
        }
    }

    /// Normalized (uppercased) cell text, empty if unavailable.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether the value differs from the previous successful fetch.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// When the fetch was performed.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Failure description, if the fetch did not produce a value.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Outcome category of a recorded check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Normal,
    Departed,
    Error,
}

impl StatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKind::Normal => "normal",
            StatusKind::Departed => "departed",
            StatusKind::Error => "error",
        }
    }
}

impl std::fmt::Display for StatusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded outcome of a check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub status: StatusKind,
    pub message: String,
}

impl HistoryEntry {
    pub fn new(status: StatusKind, message: impl Into<String>) -> Self {
        Self {
            timestamp: now_timestamp(),
            status,
            message: message.into(),
        }
    }
}
