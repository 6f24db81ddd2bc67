//! # SheetWatch Core
//!
//! Shared building blocks for the SheetWatch workspace: configuration,
//! the error type, the data model for readings and history, and the
//! capability traits the other crates plug into.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::SheetWatchConfig;
pub use error::{Result, SheetWatchError};
pub use types::{CellReading, HistoryEntry, StatusKind};
