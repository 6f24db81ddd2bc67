//! Notification system: fans a message out to every configured channel.
//! Lightweight: no queues, no retries. One attempt per channel per event.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sheetwatch_core::SheetWatchConfig;
use sheetwatch_core::traits::{Notifier, NotifyOptions};
use std::collections::VecDeque;
use tokio::sync::Mutex;

pub const DEFAULT_TITLE: &str = "Bus Status Alert";
pub const DEFAULT_PRIORITY: &str = "high";
pub const DEFAULT_TAGS: &str = "bus,alert";
pub const DEFAULT_CLICK_URL: &str = "https://login.herecomesthebus.com/Map.aspx";

/// Dispatched notifications kept in memory.
const HISTORY_CAPACITY: usize = 100;

/// A dispatched notification, as recorded by the router.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub priority: String,
    /// Whether at least one channel accepted it.
    pub delivered: bool,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Push notifications via an ntfy server (`POST {server}/{topic}`).
pub struct NtfyNotifier {
    server: String,
    topic: String,
    client: reqwest::Client,
}

impl NtfyNotifier {
    pub fn new(server: &str, topic: &str) -> Self {
        Self {
            server: server.trim_end_matches('/').to_string(),
            topic: topic.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for NtfyNotifier {
    fn name(&self) -> &str {
        "ntfy"
    }

    async fn send(&self, message: &str, options: &NotifyOptions) -> bool {
        let topic = options.topic.as_deref().unwrap_or(&self.topic);
        let url = format!("{}/{}", self.server, topic);

        let resp = self
            .client
            .post(&url)
            .header("Title", options.title.as_deref().unwrap_or(DEFAULT_TITLE))
            .header("Priority", options.priority.as_deref().unwrap_or(DEFAULT_PRIORITY))
            .header("Tags", options.tags.as_deref().unwrap_or(DEFAULT_TAGS))
            .header("Click", options.click_url.as_deref().unwrap_or(DEFAULT_CLICK_URL))
            .body(message.as_bytes().to_vec())
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await;

        match resp {
            Ok(r) if r.status() == reqwest::StatusCode::OK => {
                tracing::info!("Notification sent successfully to {url}");
                true
            }
            Ok(r) => {
                tracing::error!("Failed to send notification. Status code: {}", r.status());
                false
            }
            Err(e) => {
                tracing::error!("Error sending notification: {e}");
                false
            }
        }
    }
}

/// Records the notification in the service log. Never fails.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, message: &str, _options: &NotifyOptions) -> bool {
        tracing::info!("NOTIFICATION: {message}");
        true
    }
}

/// Notification router: sends each message through every channel.
pub struct NotifyRouter {
    notifiers: Vec<Box<dyn Notifier>>,
    history: Mutex<VecDeque<Notification>>,
}

impl NotifyRouter {
    /// Router over an explicit, ordered list of channels.
    pub fn new(notifiers: Vec<Box<dyn Notifier>>) -> Self {
        Self {
            notifiers,
            history: Mutex::new(VecDeque::new()),
        }
    }

    /// ntfy when a topic is configured, then the log channel as a fallback
    /// that always succeeds.
    pub fn from_config(config: &SheetWatchConfig) -> Self {
        let mut notifiers: Vec<Box<dyn Notifier>> = Vec::new();
        if let Some(topic) = config.topic() {
            tracing::info!("ntfy notifications enabled: {}/{}", config.ntfy_server, topic);
            notifiers.push(Box::new(NtfyNotifier::new(&config.ntfy_server, topic)));
        }
        notifiers.push(Box::new(LogNotifier));
        Self::new(notifiers)
    }

    /// Names of the configured channels, in dispatch order.
    pub fn channels(&self) -> Vec<&str> {
        self.notifiers.iter().map(|n| n.name()).collect()
    }

    /// Send `message` through every channel. Returns `true` if any channel
    /// succeeded.
    pub async fn dispatch(&self, message: &str, options: &NotifyOptions) -> bool {
        if self.notifiers.is_empty() {
            tracing::warn!("No notification providers configured");
            return false;
        }

        let mut delivered = false;
        for notifier in &self.notifiers {
            if notifier.send(message, options).await {
                delivered = true;
            } else {
                tracing::warn!("Notifier '{}' failed to deliver", notifier.name());
            }
        }

        self.record(Notification {
            title: options.title.clone().unwrap_or_else(|| DEFAULT_TITLE.into()),
            body: message.to_string(),
            priority: options
                .priority
                .clone()
                .unwrap_or_else(|| DEFAULT_PRIORITY.into()),
            delivered,
            timestamp: chrono::Utc::now(),
        })
        .await;

        delivered
    }

    async fn record(&self, notification: Notification) {
        let mut history = self.history.lock().await;
        history.push_back(notification);
        while history.len() > HISTORY_CAPACITY {
            history.pop_front();
        }
    }

    /// Recently dispatched notifications, oldest first.
    pub async fn history(&self) -> Vec<Notification> {
        self.history.lock().await.iter().cloned().collect()
    }
}
