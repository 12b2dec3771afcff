//! Liveness-check sidecar for an Ethereum node
//!
//! Answers an orchestrator's health probe by comparing the local node's
//! block height against the height reported by the Etherscan API:
//! - Startup grace period before any network checks
//! - Lazy chain-id detection and Etherscan endpoint selection
//! - Stall detection (no forward progress across a full check interval)
//! - Prometheus metrics and a JSON status endpoint

pub mod api;
pub mod config;
pub mod error;
pub mod etherscan;
pub mod metrics;
pub mod monitor;
pub mod rpc;

pub use config::MonitorConfig;
pub use error::{MonitorError, MonitorResult};
pub use etherscan::{EtherscanClient, ReferenceApi};
pub use monitor::{HeightSample, MonitorStatus, ProbeOutcome, SyncMonitor};
pub use rpc::{EthRpc, EthRpcClient};
