//! Environment-driven client configuration.

use std::time::Duration;

use yahoo_history_api::{DEFAULT_DATA_URL, DEFAULT_PAGE_URL, DEFAULT_RETRIES};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings for [`crate::HistoryClient`].
#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    pub page_url: String,
    pub data_url: String,
    pub timeout: Duration,
    /// Download attempts used when a request does not set its own.
    pub retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            page_url: DEFAULT_PAGE_URL.to_string(),
            data_url: DEFAULT_DATA_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retries: DEFAULT_RETRIES,
        }
    }
}

impl ClientConfig {
    /// Reads `YAHOO_HISTORY_PAGE_URL`, `YAHOO_HISTORY_DATA_URL`,
    /// `YAHOO_HISTORY_TIMEOUT_SECS` and `YAHOO_HISTORY_RETRY_MAX`.
    /// Missing or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            page_url: non_empty(lookup("YAHOO_HISTORY_PAGE_URL")).unwrap_or(defaults.page_url),
            data_url: non_empty(lookup("YAHOO_HISTORY_DATA_URL")).unwrap_or(defaults.data_url),
            timeout: lookup("YAHOO_HISTORY_TIMEOUT_SECS")
                .and_then(|val| val.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            retries: lookup("YAHOO_HISTORY_RETRY_MAX")
                .and_then(|val| val.trim().parse::<u32>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.retries),
        }
    }
}

fn non_empty(val: Option<String>) -> Option<String> {
    val.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
