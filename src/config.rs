//! Bus configuration.
//!
//! Every field has a default, so an empty document (or `BusConfig::default()`)
//! gives a working bus. `BusConfig::from_env` overlays `MICROBUS_*`
//! environment variables on the defaults.

use std::time::Duration;

use serde::Deserialize;

use crate::broker::QueueOptions;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BusConfig {
    /// Upper bound on how long a consumer loop blocks in one receive call.
    /// Bounds how quickly a loop notices a stop signal.
    pub poll_interval_ms: u64,
    /// Flags used when declaring event queues.
    pub queue: QueueOptions,
    /// Consumer loop reconnect behaviour after a connection fault.
    pub reconnect: ReconnectPolicy,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            queue: QueueOptions::default(),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    100
}

/// Exponential backoff used by consumer loops to reopen a broken channel.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReconnectPolicy {
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// Consecutive failed attempts before the loop gives up. `None` retries
    /// forever.
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_backoff_ms: 50,
            max_backoff_ms: 5_000,
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let ms = self
            .initial_backoff_ms
            .saturating_mul(1u64 << shift)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }

    /// Whether another attempt is allowed after `failures` consecutive
    /// failures.
    pub fn allows(&self, failures: u32) -> bool {
        self.max_attempts.map_or(true, |max| failures < max)
    }
}

impl BusConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Defaults overlaid with `MICROBUS_*` environment variables.
    ///
    /// Unset, empty or unparsable variables keep the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|s| !s.is_empty());
        let mut config = Self::default();

        if let Some(ms) = var("MICROBUS_POLL_INTERVAL_MS").and_then(|v| v.parse().ok()) {
            config.poll_interval_ms = ms;
        }
        if let Some(durable) = var("MICROBUS_QUEUE_DURABLE").and_then(|v| parse_bool(&v)) {
            config.queue.durable = durable;
        }
        if let Some(ms) = var("MICROBUS_RECONNECT_INITIAL_MS").and_then(|v| v.parse().ok()) {
            config.reconnect.initial_backoff_ms = ms;
        }
        if let Some(ms) = var("MICROBUS_RECONNECT_MAX_MS").and_then(|v| v.parse().ok()) {
            config.reconnect.max_backoff_ms = ms;
        }
        if let Some(max) = var("MICROBUS_RECONNECT_MAX_ATTEMPTS").and_then(|v| v.parse().ok()) {
            config.reconnect.max_attempts = Some(max);
        }

        config
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
