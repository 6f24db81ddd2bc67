//! Polling scheduler. Owns the background loop that runs checks on a fixed
//! interval, plus the start/stop/check-now lifecycle around it.

use serde::Serialize;
use sheetwatch_core::types::HistoryEntry;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::monitor::SheetMonitor;

/// How long `stop` waits for the background task before giving up on it.
pub const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// History entries included in a status snapshot.
pub const STATUS_HISTORY_LIMIT: usize = 10;

/// Read-only view of the service for the control surface.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub is_active: bool,
    pub last_result: String,
    pub last_check_time: String,
    pub history: Vec<HistoryEntry>,
}

#[derive(Default)]
struct ServiceState {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

pub struct PollingScheduler {
    monitor: Arc<SheetMonitor>,
    polling_interval: Duration,
    /// Mirrors whether a loop is running, readable without the lifecycle lock.
    is_active: AtomicBool,
    service: Mutex<ServiceState>,
}

impl PollingScheduler {
    pub fn new(monitor: Arc<SheetMonitor>, polling_interval: Duration) -> Self {
        Self {
            monitor,
            polling_interval,
            is_active: AtomicBool::new(false),
            service: Mutex::new(ServiceState::default()),
        }
    }

    pub fn monitor(&self) -> &Arc<SheetMonitor> {
        &self.monitor
    }

    pub fn polling_interval(&self) -> Duration {
        self.polling_interval
    }

    pub fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst)
    }

    /// Start polling. Returns `false` if a loop is already running.
    ///
    /// Runs one check before returning, so status is fresh by then. The
    /// lifecycle lock is released first; the loop's first scheduled check
    /// is a full interval away.
    pub async fn start(&self) -> bool {
        {
            let mut service = self.service.lock().await;
            let alive = service.handle.as_ref().is_some_and(|h| !h.is_finished());
            if self.is_active() && alive {
                tracing::warn!("Monitoring service is already running");
                return false;
            }

            tracing::info!(
                "Starting monitoring service with {} second interval",
                self.polling_interval.as_secs()
            );
            let cancel_token = CancellationToken::new();
            let handle = tokio::spawn(polling_loop(
                self.monitor.clone(),
                self.polling_interval,
                cancel_token.clone(),
            ));
            service.handle = Some(handle);
            service.cancel_token = Some(cancel_token);
            self.is_active.store(true, Ordering::SeqCst);
        }

        self.monitor.check_cell().await;
        true
    }

    /// Stop polling. Returns `false` if nothing was running.
    ///
    /// The service counts as stopped as soon as the signal is sent; the
    /// background task gets up to [`STOP_TIMEOUT`] to finish on its own.
    pub async fn stop(&self) -> bool {
        let mut service = self.service.lock().await;
        if !self.is_active() {
            tracing::warn!("Monitoring service is not running");
            return false;
        }

        tracing::info!("Stopping monitoring service");
        if let Some(token) = service.cancel_token.take() {
            token.cancel();
        }
        self.is_active.store(false, Ordering::SeqCst);

        if let Some(handle) = service.handle.take() {
            match tokio::time::timeout(STOP_TIMEOUT, handle).await {
                Ok(Ok(())) => tracing::debug!("Monitoring loop joined"),
                Ok(Err(e)) => tracing::warn!("Monitoring loop ended abnormally: {e}"),
                Err(_) => tracing::warn!(
                    "Monitoring loop did not stop within {}s; leaving it to finish",
                    STOP_TIMEOUT.as_secs()
                ),
            }
        }
        true
    }

    /// Run a check right now, whether or not polling is active.
    pub async fn check_now(&self) -> bool {
        tracing::info!("Performing immediate check");
        self.monitor.check_cell().await
    }

    pub async fn status(&self) -> ServiceStatus {
        let (last_result, last_check_time, history) =
            self.monitor.snapshot(STATUS_HISTORY_LIMIT).await;
        ServiceStatus {
            is_active: self.is_active(),
            last_result,
            last_check_time,
            history,
        }
    }
}

/// Wait out the interval (or the cancel signal), check, repeat.
/// `check_cell` absorbs failures and panics, so the loop only ends on cancel.
async fn polling_loop(
    monitor: Arc<SheetMonitor>,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    tracing::info!("Monitoring loop started");

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            _ = tokio::time::sleep(interval) => {
                monitor.check_cell().await;
            }
        }
    }

    tracing::info!("Monitoring loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{LogNotifier, NotifyRouter};
    use async_trait::async_trait;
    use sheetwatch_core::error::Result;
    use sheetwatch_core::traits::CellSource;
    use sheetwatch_core::types::CellReading;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    /// Returns a fresh value on every call; panics on the calls listed in
    /// `panic_on` (1-based).
    struct CountingSource {
        calls: AtomicUsize,
        panic_on: Vec<usize>,
    }

    #[async_trait]
    impl CellSource for CountingSource {
        async fn read_cell(&self) -> Result<CellReading> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.panic_on.contains(&n) {
                panic!("simulated failure on call {n}");
            }
            Ok(CellReading::ok(format!("VALUE {n}"), true))
        }
    }

    fn scheduler(interval: Duration, panic_on: Vec<usize>) -> (PollingScheduler, Arc<CountingSource>) {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            panic_on,
        });
        let router = Arc::new(NotifyRouter::new(vec![Box::new(LogNotifier)]));
        let monitor = Arc::new(SheetMonitor::new(source.clone(), router));
        (PollingScheduler::new(monitor, interval), source)
    }

    #[tokio::test]
    async fn test_start_runs_immediate_check() {
        let (sched, source) = scheduler(Duration::from_secs(3600), vec![]);
        assert!(!sched.is_active());
        assert!(sched.start().await);
        assert!(sched.is_active());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        let status = sched.status().await;
        assert!(status.is_active);
        assert_eq!(status.last_result, "Current Status: 'VALUE 1'");
        assert_eq!(status.history.len(), 1);
        sched.stop().await;
    }

    #[tokio::test]
    async fn test_start_twice_returns_false() {
        let (sched, source) = scheduler(Duration::from_secs(3600), vec![]);
        assert!(sched.start().await);
        assert!(!sched.start().await);
        // The second start neither checked nor spawned anything.
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(sched.stop().await);
    }

    #[tokio::test]
    async fn test_stop_when_stopped_returns_false() {
        let (sched, _) = scheduler(Duration::from_secs(3600), vec![]);
        assert!(!sched.stop().await);
        assert!(sched.start().await);
        assert!(sched.stop().await);
        assert!(!sched.is_active());
        assert!(!sched.stop().await);
    }

    #[tokio::test]
    async fn test_stop_is_prompt_during_long_wait() {
        let (sched, _) = scheduler(Duration::from_secs(3600), vec![]);
        sched.start().await;
        let begun = Instant::now();
        assert!(sched.stop().await);
        assert!(begun.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_loop_checks_on_interval() {
        let (sched, source) = scheduler(Duration::from_millis(20), vec![]);
        sched.start().await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        sched.stop().await;

        let calls = source.calls.load(Ordering::SeqCst);
        assert!(calls >= 3, "expected several scheduled checks, got {calls}");

        // No more checks after stop.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test]
    async fn test_loop_survives_panicking_check() {
        let (sched, source) = scheduler(Duration::from_millis(20), vec![2]);
        sched.start().await;
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(sched.is_active());
        assert!(source.calls.load(Ordering::SeqCst) > 2);
        assert!(sched.stop().await);
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let (sched, source) = scheduler(Duration::from_secs(3600), vec![]);
        assert!(sched.start().await);
        assert!(sched.stop().await);
        assert!(sched.start().await);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert!(sched.stop().await);
    }

    #[tokio::test]
    async fn test_check_now_works_when_stopped() {
        let (sched, source) = scheduler(Duration::from_secs(3600), vec![]);
        assert!(!sched.check_now().await);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(!sched.is_active());
        assert_eq!(sched.status().await.history.len(), 1);
    }

    #[tokio::test]
    async fn test_status_limits_history() {
        let (sched, _) = scheduler(Duration::from_secs(3600), vec![]);
        for _ in 0..15 {
            sched.check_now().await;
        }
        let status = sched.status().await;
        assert_eq!(status.history.len(), STATUS_HISTORY_LIMIT);
        assert_eq!(status.history[9].message, "Current Status: 'VALUE 15'");
    }

    #[tokio::test]
    async fn test_concurrent_starts_spawn_one_loop() {
        let (sched, source) = scheduler(Duration::from_secs(3600), vec![]);
        let sched = Arc::new(sched);
        let a = tokio::spawn({
            let s = sched.clone();
            async move { s.start().await }
        });
        let b = tokio::spawn({
            let s = sched.clone();
            async move { s.start().await }
        });
        let (a, b) = (a.await.unwrap(), b.await.unwrap());
        assert!(a ^ b, "exactly one start should succeed");
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        sched.stop().await;
    }

    #[tokio::test]
    async fn test_start_survives_panicking_first_check() {
        let (sched, source) = scheduler(Duration::from_secs(3600), vec![1]);
        assert!(sched.start().await);
        assert!(sched.is_active());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        let status = sched.status().await;
        assert!(status.last_result.contains("panicked: simulated failure on call 1"));
        assert!(sched.stop().await);
    }

    #[tokio::test]
    async fn test_check_now_survives_panic() {
        let (sched, _) = scheduler(Duration::from_secs(3600), vec![1]);
        assert!(!sched.check_now().await);
        assert!(!sched.check_now().await);
        assert_eq!(sched.status().await.last_result, "Current Status: 'VALUE 2'");
    }

    /// Hangs forever on its second read; every other read succeeds at once.
    struct HangingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CellSource for HangingSource {
        async fn read_cell(&self) -> Result<CellReading> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 1 {
                std::future::pending::<()>().await;
            }
            Ok(CellReading::ok("ON TIME", true))
        }
    }

    fn hanging_scheduler(interval: Duration) -> (PollingScheduler, Arc<HangingSource>) {
        let source = Arc::new(HangingSource {
            calls: AtomicUsize::new(0),
        });
        let router = Arc::new(NotifyRouter::new(vec![Box::new(LogNotifier)]));
        let monitor = Arc::new(SheetMonitor::new(source.clone(), router));
        (PollingScheduler::new(monitor, interval), source)
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_gives_up_on_stuck_check() {
        let (sched, source) = hanging_scheduler(Duration::from_secs(1));
        assert!(sched.start().await);

        // Let the loop enter its first scheduled check, which never finishes.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        let begun = tokio::time::Instant::now();
        assert!(sched.stop().await);
        let waited = begun.elapsed();
        assert!(!sched.is_active());
        assert!(waited >= STOP_TIMEOUT);
        assert!(waited < STOP_TIMEOUT + Duration::from_secs(1));

        // The stuck task is abandoned, not waited on again.
        assert!(!sched.stop().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_now_not_blocked_by_stuck_check() {
        let (sched, source) = hanging_scheduler(Duration::from_secs(1));
        assert!(sched.start().await);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        let checked = tokio::time::timeout(Duration::from_secs(1), sched.check_now()).await;
        assert!(matches!(checked, Ok(false)));

        let status = sched.status().await;
        assert!(status.is_active);
        assert_eq!(status.history.len(), 2);
        assert!(sched.stop().await);
    }
}
