//! Engine configuration.

use std::time::Duration;

use anyhow::{Context, Result};
use std::env;

/// Configuration for the submission and polling engine.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Aggregator base URL.
    pub aggregator_url: String,
    /// Network identifier stamped into offline packages.
    pub network: String,
    /// Fixed interval between proof polls.
    pub poll_interval: Duration,
    /// Hard wall-clock bound on the whole polling phase.
    pub poll_timeout: Duration,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            aggregator_url: "http://localhost:9100".to_string(),
            network: "testnet".to_string(),
            poll_interval: Duration::from_secs(1),
            poll_timeout: Duration::from_secs(60),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let aggregator_url =
            env::var("HANDOVER_AGGREGATOR_URL").context("HANDOVER_AGGREGATOR_URL must be set")?;

        let network = env::var("HANDOVER_NETWORK").unwrap_or_else(|_| "testnet".to_string());

        let poll_interval_ms: u64 = env::var("HANDOVER_POLL_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1_000);

        let poll_timeout_secs: u64 = env::var("HANDOVER_POLL_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);

        let request_timeout_secs: u64 = env::var("HANDOVER_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        Ok(Self {
            aggregator_url,
            network,
            poll_interval: Duration::from_millis(poll_interval_ms),
            poll_timeout: Duration::from_secs(poll_timeout_secs),
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }
}
