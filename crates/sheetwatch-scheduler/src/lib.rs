//! # SheetWatch Scheduler
//!
//! The monitoring core: change detection, notification fan-out, and the
//! polling loop that ties them together.
//!
//! ## Architecture
//! ```text
//! PollingScheduler (tokio task + CancellationToken)
//!   └── every polling_interval → SheetMonitor::check_cell
//!         ├── CellSource::read_cell (fetch + retry)
//!         ├── classify: error / unchanged / normal / departed
//!         ├── record history (last 50)
//!         └── departed → NotifyRouter::dispatch
//!                          ├── ntfy (if a topic is configured)
//!                          └── log (always)
//! ```

pub mod engine;
pub mod monitor;
pub mod notify;

pub use engine::{PollingScheduler, ServiceStatus};
pub use monitor::{MAX_HISTORY, SheetMonitor};
pub use notify::{LogNotifier, Notification, NotifyRouter, NtfyNotifier};

use sheetwatch_core::SheetWatchConfig;
use sheetwatch_core::error::Result;
use std::sync::Arc;

/// Wire the production fetcher, router, monitor, and scheduler from config.
///
/// Fails if the configuration has no API key.
pub fn build_service(config: &SheetWatchConfig) -> Result<PollingScheduler> {
    let fetcher = sheetwatch_sheets::create_fetcher(config)?;
    let router = Arc::new(NotifyRouter::from_config(config));
    tracing::info!("Notification channels: {}", router.channels().join(", "));

    let monitor = SheetMonitor::new(Arc::new(fetcher), router)
        .with_keywords(&config.trigger_keyword, &config.negation_keyword);
    Ok(PollingScheduler::new(
        Arc::new(monitor),
        config.polling_interval(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetwatch_core::error::SheetWatchError;

    #[test]
    fn test_build_service_refuses_without_api_key() {
        let config = SheetWatchConfig::default();
        assert!(matches!(
            build_service(&config),
            Err(SheetWatchError::MissingApiKey)
        ));
    }

    #[test]
    fn test_build_service_uses_interval() {
        let config = SheetWatchConfig {
            api_key: Some("key".into()),
            polling_interval: 12,
            ..Default::default()
        };
        let sched = build_service(&config).unwrap();
        assert_eq!(sched.polling_interval().as_secs(), 12);
        assert!(!sched.is_active());
    }
}
