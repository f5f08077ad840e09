//! Demo server configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the demo server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `8001`, `0` for auto-assign).
    pub port: u16,
    /// Interval between update ticks in milliseconds.
    pub tick_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8001,
            tick_ms: 1_000,
        }
    }
}

impl DemoConfig {
    /// Tick interval as a duration.
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// `host:port` bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
