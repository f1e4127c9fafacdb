//! Configuration for in-process proxy sessions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the session runtime that fronts a proxy-mounted server.
///
/// Deserializable from any serde format; missing fields take their
/// defaults.
///
/// ```rust
/// use mcpmount_server::RuntimeConfig;
///
/// let config: RuntimeConfig =
///     serde_json::from_str(r#"{"max_concurrent_requests": 8}"#).unwrap();
/// assert_eq!(config.max_concurrent_requests, 8);
/// assert_eq!(config.channel_capacity, 32);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Per-direction message buffer of the in-memory transport.
    pub channel_capacity: usize,
    /// Maximum requests a session runtime serves at once.
    pub max_concurrent_requests: usize,
    /// Client name sent in `initialize`.
    pub client_name: String,
    /// Optional per-request timeout, in milliseconds.
    pub request_timeout_ms: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 32,
            max_concurrent_requests: 64,
            client_name: "mcpmount-proxy".to_string(),
            request_timeout_ms: None,
        }
    }
}

impl RuntimeConfig {
    /// The request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }
}
