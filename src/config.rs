use crate::error::{WatchError, WatchResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a [`DealWatcher`](crate::watcher::DealWatcher) instance.
///
/// Constructed once by the caller and passed by reference into whichever
/// component needs it; nothing in this crate reads ambient global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Sleep between polling passes, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Deadline for push-based publish waits, in milliseconds.
    #[serde(default = "default_publish_timeout_ms")]
    pub publish_timeout_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_publish_timeout_ms() -> u64 {
    60_000
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            publish_timeout_ms: default_publish_timeout_ms(),
        }
    }
}

impl WatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }

    /// Set the polling interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the publish-wait deadline
    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout_ms = timeout.as_millis() as u64;
        self
    }
}

/// Load a watch configuration from the given path or from the `WATCH_CONFIG`
/// environment variable.
///
/// If the file does not exist, a default [`WatchConfig`] is returned. A file
/// that exists but fails to parse is an error.
pub fn load_watch_config(path: Option<&str>) -> WatchResult<WatchConfig> {
    use std::fs;

    let config_path = path
        .map(|p| p.to_string())
        .or_else(|| std::env::var("WATCH_CONFIG").ok())
        .unwrap_or_else(|| "config/watch_config.json".to_string());

    match fs::read_to_string(&config_path) {
        Ok(config_str) => serde_json::from_str::<WatchConfig>(&config_str).map_err(|e| {
            log::error!("failed to parse watch configuration {}: {}", config_path, e);
            WatchError::Config(e.to_string())
        }),
        Err(_) => Ok(WatchConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = WatchConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.publish_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn builder_overrides() {
        let config = WatchConfig::default()
            .with_poll_interval(Duration::from_millis(50))
            .with_publish_timeout(Duration::from_secs(5));
        assert_eq!(config.poll_interval_ms, 50);
        assert_eq!(config.publish_timeout_ms, 5_000);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = load_watch_config(Some("does/not/exist.json")).unwrap();
        assert_eq!(config.poll_interval_ms, 500);
    }

    #[test]
    fn loads_from_file_with_partial_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"poll_interval_ms\": 100}}").unwrap();
        let config = load_watch_config(file.path().to_str()).unwrap();
        assert_eq!(config.poll_interval_ms, 100);
        // untouched field falls back to its serde default
        assert_eq!(config.publish_timeout_ms, 60_000);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = load_watch_config(file.path().to_str()).unwrap_err();
        assert!(matches!(err, WatchError::Config(_)));
    }
}
