//! Error types for SheetWatch.

use thiserror::Error;

/// Errors raised across the workspace.
///
/// Most runtime failures (fetch errors, notification failures) are recovered
/// locally and surfaced through status/history instead; this type carries
/// the ones that still need to travel through `?`.
#[derive(Debug, Error)]
pub enum SheetWatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No API key found. Set GOOGLE_API_KEY, add api_key to the config file, or create an api_key.txt file")]
    MissingApiKey,

    #[error("Sheets API error: {0}")]
    Sheets(String),

    #[error("Check failed: {0}")]
    Check(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SheetWatchError>;
