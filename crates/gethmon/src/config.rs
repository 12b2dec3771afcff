//! Monitor configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{MonitorError, MonitorResult};

/// Sync monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// HTTP listen address for the probe endpoint
    pub listen_addr: String,

    /// Startup grace period before any sync checks (seconds)
    pub start_wait_secs: u64,

    /// Minimum interval without progress before the node counts as stalled (seconds)
    pub update_interval_secs: u64,

    /// Local node JSON-RPC endpoint
    pub rpc_url: String,

    /// Per-call timeout for outbound HTTP (seconds)
    pub rpc_timeout_secs: u64,

    /// Maximum acceptable height difference before the node counts as unsynced
    pub max_sync_diff: u64,

    /// Etherscan API key, required for reference height queries
    #[serde(skip_serializing)]
    pub etherscan_api_key: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            start_wait_secs: 900,
            update_interval_secs: 300,
            rpc_url: "http://localhost:8545".to_string(),
            rpc_timeout_secs: 30,
            max_sync_diff: 50,
            etherscan_api_key: String::new(),
        }
    }
}

impl MonitorConfig {
    /// Load from environment variables with defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        if let Ok(wait) = std::env::var("START_WAIT_TIME") {
            config.start_wait_secs = wait.parse().unwrap_or(config.start_wait_secs);
        }

        if let Ok(interval) = std::env::var("UPDATE_INTERVAL") {
            config.update_interval_secs = interval.parse().unwrap_or(config.update_interval_secs);
        }

        // The node runs next to us; ETH_RPC_PORT points at its RPC port on
        // localhost. ETH_RPC_URL overrides the whole URL.
        if let Ok(port) = std::env::var("ETH_RPC_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                config.rpc_url = format!("http://localhost:{}", port);
            }
        }

        if let Ok(url) = std::env::var("ETH_RPC_URL") {
            config.rpc_url = url;
        }

        if let Ok(timeout) = std::env::var("ETH_RPC_TIMEOUT") {
            config.rpc_timeout_secs = timeout.parse().unwrap_or(config.rpc_timeout_secs);
        }

        if let Ok(diff) = std::env::var("ETH_MAX_SYNC_DIFF") {
            config.max_sync_diff = diff.parse().unwrap_or(config.max_sync_diff);
        }

        if let Ok(key) = std::env::var("ETHERSCAN_API_KEY") {
            config.etherscan_api_key = key;
        }

        config
    }

    /// Check that required settings are present
    pub fn validate(&self) -> MonitorResult<()> {
        if self.etherscan_api_key.is_empty() {
            return Err(MonitorError::Config(
                "ETHERSCAN_API_KEY is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Get startup grace period duration
    pub fn start_wait_duration(&self) -> Duration {
        Duration::from_secs(self.start_wait_secs)
    }

    /// Get stall check interval duration
    pub fn update_interval_duration(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    /// Get outbound call timeout duration
    pub fn rpc_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }
}
