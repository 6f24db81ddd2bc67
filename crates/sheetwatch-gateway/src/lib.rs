//! # SheetWatch Gateway
//!
//! HTTP control surface: an HTML dashboard plus JSON endpoints to start and
//! stop polling, force a check, and read status and history.

pub mod dashboard;
pub mod routes;
pub mod server;

pub use server::{AppState, build_router, start};
