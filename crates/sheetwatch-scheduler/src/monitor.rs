//! Change monitor: one check of the watched cell.
//!
//! A check fetches the cell, decides whether anything worth recording
//! happened, keeps a bounded history of outcomes, and notifies when the
//! trigger keyword shows up without the negation keyword.

use futures::FutureExt;
use sheetwatch_core::error::{Result, SheetWatchError};
use sheetwatch_core::traits::{CellSource, NotifyOptions};
use sheetwatch_core::types::{CellReading, HistoryEntry, StatusKind};
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::notify::NotifyRouter;

/// History entries kept in memory.
pub const MAX_HISTORY: usize = 50;

/// Mutable monitor state. Only [`SheetMonitor`] writes to it.
#[derive(Debug, Clone)]
pub struct MonitorState {
    pub last_check_result: String,
    pub last_check_time: String,
    pub history: VecDeque<HistoryEntry>,
}

impl MonitorState {
    fn new() -> Self {
        Self {
            last_check_result: "No check performed yet".into(),
            last_check_time: String::new(),
            history: VecDeque::with_capacity(MAX_HISTORY),
        }
    }

    /// Set the summary and append a history entry, evicting the oldest.
    fn record(&mut self, status: StatusKind, message: String) {
        self.last_check_result = message.clone();
        self.history.push_back(HistoryEntry::new(status, message));
        while self.history.len() > MAX_HISTORY {
            self.history.pop_front();
        }
    }

    fn recent(&self, limit: usize) -> Vec<HistoryEntry> {
        let skip = self.history.len().saturating_sub(limit);
        self.history.iter().skip(skip).cloned().collect()
    }
}

pub struct SheetMonitor {
    source: Arc<dyn CellSource>,
    router: Arc<NotifyRouter>,
    trigger_keyword: String,
    negation_keyword: String,
    /// Held only while classifying and recording, never across the fetch.
    state: Mutex<MonitorState>,
}

impl SheetMonitor {
    pub fn new(source: Arc<dyn CellSource>, router: Arc<NotifyRouter>) -> Self {
        Self {
            source,
            router,
            trigger_keyword: "DEPARTED".into(),
            negation_keyword: "NOT".into(),
            state: Mutex::new(MonitorState::new()),
        }
    }

    pub fn with_keywords(mut self, trigger: &str, negation: &str) -> Self {
        self.trigger_keyword = trigger.to_uppercase();
        self.negation_keyword = negation.to_uppercase();
        self
    }

    pub fn router(&self) -> &Arc<NotifyRouter> {
        &self.router
    }

    /// Run one check. Returns `true` if a notification was triggered.
    /// Never fails: every problem, a panicking source included, ends up as an
    /// error entry in the history.
    pub async fn check_cell(&self) -> bool {
        let outcome = match AssertUnwindSafe(self.run_check()).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => Err(SheetWatchError::Check(format!(
                "panicked: {}",
                panic_message(&panic)
            ))),
        };
        match outcome {
            Ok(triggered) => triggered,
            Err(e) => {
                let message = format!("Error checking spreadsheet: {e}");
                tracing::error!("{message}");
                self.state.lock().await.record(StatusKind::Error, message);
                false
            }
        }
    }

    async fn run_check(&self) -> Result<bool> {
        let reading = self.source.read_cell().await?;

        let message = {
            let mut state = self.state.lock().await;
            state.last_check_time = format!("Last Checked: {}", reading.timestamp());

            match self.classify(&reading, state.history.is_empty()) {
                Outcome::Failed(message) => {
                    tracing::error!("{message}");
                    state.record(StatusKind::Error, message);
                    return Ok(false);
                }
                Outcome::Unchanged(message) => {
                    tracing::debug!("{message}");
                    state.last_check_result = message;
                    return Ok(false);
                }
                Outcome::Normal(message) => {
                    tracing::info!("{message}");
                    state.record(StatusKind::Normal, message);
                    return Ok(false);
                }
                Outcome::Departed(message) => {
                    tracing::info!("{message}");
                    state.record(StatusKind::Departed, message.clone());
                    message
                }
            }
        };

        if !self.router.dispatch(&message, &NotifyOptions::default()).await {
            tracing::warn!("Notification was not delivered by any channel");
        }
        Ok(true)
    }

    fn classify(&self, reading: &CellReading, first_check: bool) -> Outcome {
        if let Some(err) = reading.error() {
            return Outcome::Failed(format!("Error checking spreadsheet: {err}"));
        }
        if !reading.is_new() && !first_check {
            return Outcome::Unchanged(format!("Current value: '{}'", reading.value()));
        }
        if self.is_transition(reading.value()) {
            Outcome::Departed(format!("*** {} ***", reading.value()))
        } else {
            Outcome::Normal(format!("Current Status: '{}'", reading.value()))
        }
    }

    /// Trigger keyword present and negation keyword absent.
    fn is_transition(&self, value: &str) -> bool {
        let value = value.to_uppercase();
        value.contains(&self.trigger_keyword)
            && (self.negation_keyword.is_empty() || !value.contains(&self.negation_keyword))
    }

    /// The most recent `limit` entries, oldest first.
    pub async fn get_history(&self, limit: usize) -> Vec<HistoryEntry> {
        self.state.lock().await.recent(limit)
    }

    pub async fn last_check_result(&self) -> String {
        self.state.lock().await.last_check_result.clone()
    }

    pub async fn last_check_time(&self) -> String {
        self.state.lock().await.last_check_time.clone()
    }

    /// Summary, check time, and the `limit` most recent entries, read under
    /// one lock.
    pub async fn snapshot(&self, limit: usize) -> (String, String, Vec<HistoryEntry>) {
        let state = self.state.lock().await;
        (
            state.last_check_result.clone(),
            state.last_check_time.clone(),
            state.recent(limit),
        )
    }
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".into()
    }
}

enum Outcome {
    Failed(String),
    Unchanged(String),
    Normal(String),
    Departed(String),
}
