//! SheetWatch configuration system.
//!
//! Resolution order: built-in defaults → TOML config file → environment
//! variables → `api_key.txt` next to the config file (API key only).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, SheetWatchError};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetWatchConfig {
    /// Google API key used for the Sheets v4 API.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Spreadsheet to watch.
    #[serde(default)]
    pub spreadsheet_id: String,
    /// A1 range of the watched cell, e.g. `PM!D19:E19`.
    #[serde(default)]
    pub range_name: String,
    /// Seconds between scheduled checks.
    #[serde(default = "default_polling_interval")]
    pub polling_interval: u64,
    /// ntfy topic. Push notifications are disabled when unset.
    #[serde(default)]
    pub notification_topic: Option<String>,
    #[serde(default = "default_ntfy_server")]
    pub ntfy_server: String,
    #[serde(default = "default_sheets_base_url")]
    pub sheets_base_url: String,
    /// Keyword whose appearance counts as the watched transition.
    #[serde(default = "default_trigger_keyword")]
    pub trigger_keyword: String,
    /// Keyword that cancels the transition when present.
    #[serde(default = "default_negation_keyword")]
    pub negation_keyword: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_polling_interval() -> u64 { 30 }
fn default_ntfy_server() -> String { "https://ntfy.sh".into() }
fn default_sheets_base_url() -> String { "https://sheets.googleapis.com".into() }
fn default_trigger_keyword() -> String { "DEPARTED".into() }
fn default_negation_keyword() -> String { "NOT".into() }
fn default_max_retries() -> u32 { 3 }
fn default_retry_delay_secs() -> u64 { 5 }

impl Default for SheetWatchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            spreadsheet_id: String::new(),
            range_name: String::new(),
            polling_interval: default_polling_interval(),
            notification_topic: None,
            ntfy_server: default_ntfy_server(),
            sheets_base_url: default_sheets_base_url(),
            trigger_keyword: default_trigger_keyword(),
            negation_keyword: default_negation_keyword(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            gateway: GatewayConfig::default(),
        }
    }
}

/// HTTP control surface configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 { 5588 }
fn default_host() -> String { "0.0.0.0".into() }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl SheetWatchConfig {
    /// Load the full configuration: file (if present), then process
    /// environment, then `api_key.txt`. Does not validate.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            tracing::info!("Loading configuration from {}", path.display());
            Self::load_from(path)?
        } else {
            tracing::info!("No config file at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        if config.api_key.is_none() {
            let key_file = path
                .parent()
                .unwrap_or(Path::new("."))
                .join("api_key.txt");
            config.load_api_key_file(&key_file);
        }
        Ok(config)
    }

    /// Load config from a specific TOML file. Read failures surface as
    /// [`SheetWatchError::Io`], bad contents as [`SheetWatchError::Config`].
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| SheetWatchError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Default config path: `$SHEETWATCH_CONFIG` or `./config.toml`.
    pub fn default_path() -> PathBuf {
        std::env::var("SHEETWATCH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"))
    }

    /// Override fields from environment variables. `lookup` returns the
    /// value of a variable; empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get("GOOGLE_API_KEY") {
            self.api_key = Some(v);
        }
        if let Some(v) = get("SPREADSHEET_ID") {
            self.spreadsheet_id = v;
        }
        if let Some(v) = get("RANGE_NAME") {
            self.range_name = v;
        }
        if let Some(v) = get("NOTIFICATION_TOPIC") {
            self.notification_topic = Some(v);
        }
        if let Some(v) = get("HOST") {
            self.gateway.host = v;
        }
        if let Some(v) = get("POLLING_INTERVAL") {
            match v.parse() {
                Ok(n) => self.polling_interval = n,
                Err(_) => tracing::warn!("Could not convert POLLING_INTERVAL={v} to int. Using default."),
            }
        }
        if let Some(v) = get("PORT") {
            match v.parse() {
                Ok(n) => self.gateway.port = n,
                Err(_) => tracing::warn!("Could not convert PORT={v} to int. Using default."),
            }
        }
    }

    /// Read the API key from a plain-text file, if it exists.
    pub fn load_api_key_file(&mut self, path: &Path) {
        if !path.exists() {
            return;
        }
        tracing::info!("Loading API key from {}", path.display());
        match std::fs::read_to_string(path) {
            Ok(s) => {
                let key = s.trim();
                if !key.is_empty() {
                    self.api_key = Some(key.to_string());
                }
            }
            Err(e) => tracing::error!("Error loading API key file: {e}"),
        }
    }

    /// Reject configurations the service cannot start with.
    pub fn validate(&self) -> Result<()> {
        match &self.api_key {
            Some(k) if !k.trim().is_empty() => {}
            _ => return Err(SheetWatchError::MissingApiKey),
        }
        if self.polling_interval == 0 {
            return Err(SheetWatchError::Config(
                "polling_interval must be positive".into(),
            ));
        }
        if self.spreadsheet_id.is_empty() || self.range_name.is_empty() {
            tracing::warn!("spreadsheet_id or range_name is empty; every check will fail");
        }
        Ok(())
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// Configured topic, if non-empty.
    pub fn topic(&self) -> Option<&str> {
        self.notification_topic
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }
}
