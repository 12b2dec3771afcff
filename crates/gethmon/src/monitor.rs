//! Sync monitoring and stall detection
//!
//! One probe evaluation runs end to end under the state lock: grace check,
//! lazy network resolution, height sampling, stall assessment, state update.
//! The external prober drives the cadence; nothing here polls on its own.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::MonitorConfig;
use crate::error::{MonitorError, MonitorResult};
use crate::etherscan::{self, ReferenceApi};
use crate::metrics;
use crate::rpc::EthRpc;

/// One height comparison against the reference source. Immutable once taken.
#[derive(Debug, Clone, Serialize)]
pub struct HeightSample {
    pub observed_at: DateTime<Utc>,
    pub local_height: u64,
    pub reference_height: u64,
    /// `reference_height - local_height`, clamped at zero
    pub diff: u64,
}

/// Probe verdicts that map to a passing probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Startup grace period still running; no network calls were made
    Starting,
    /// Node within the allowed height difference
    Synced,
    /// Node behind the reference but still advancing
    Behind,
}

/// Process-wide monitor state, mutated only under the probe lock
#[derive(Debug)]
struct MonitorState {
    start_time: Instant,
    started_at: DateTime<Utc>,
    chain_id: Option<u64>,
    reference_url: Option<&'static str>,
    last_diff: Option<u64>,
    last_check_at: Option<Instant>,
    last_sample: Option<HeightSample>,
}

/// Diagnostic snapshot for the status endpoint
#[derive(Debug, Clone, Serialize)]
pub struct MonitorStatus {
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
    pub in_grace_period: bool,
    pub chain_id: Option<u64>,
    pub reference_url: Option<String>,
    pub last_sample: Option<HeightSample>,
    pub max_sync_diff: u64,
    pub update_interval_secs: u64,
}

/// Sync monitor: compares local and reference heights and flags a node
/// that has stopped making progress
pub struct SyncMonitor {
    config: MonitorConfig,
    rpc: Arc<dyn EthRpc>,
    reference: Arc<dyn ReferenceApi>,
    state: Mutex<MonitorState>,
}

impl SyncMonitor {
    pub fn new(config: MonitorConfig, rpc: Arc<dyn EthRpc>, reference: Arc<dyn ReferenceApi>) -> Self {
        Self {
            config,
            rpc,
            reference,
            state: Mutex::new(MonitorState {
                start_time: Instant::now(),
                started_at: Utc::now(),
                chain_id: None,
                reference_url: None,
                last_diff: None,
                last_check_at: None,
                last_sample: None,
            }),
        }
    }

    /// Run one probe evaluation
    pub async fn probe(&self) -> MonitorResult<ProbeOutcome> {
        self.probe_at(Instant::now()).await
    }

    async fn probe_at(&self, now: Instant) -> MonitorResult<ProbeOutcome> {
        // Held across the network calls so overlapping prober invocations
        // cannot interleave their updates to last_diff/last_check_at.
        let mut state = self.state.lock().await;

        if now.duration_since(state.start_time) <= self.config.start_wait_duration() {
            debug!("Still in startup grace period, skipping sync check");
            return Ok(ProbeOutcome::Starting);
        }

        let reference_url = match state.reference_url {
            Some(url) => url,
            None => {
                let chain_id = self.rpc.network_version().await?;
                let url = etherscan::reference_api_url(chain_id)
                    .ok_or(MonitorError::UnsupportedNetwork(chain_id))?;

                info!(
                    "Detected ethereum network {} with reference API {}",
                    chain_id, url
                );

                // Memoized for the process lifetime; a running node does
                // not change chains.
                state.chain_id = Some(chain_id);
                state.reference_url = Some(url);
                url
            }
        };

        // A failed sample fails the probe and leaves state untouched.
        let sample = self.take_sample(reference_url).await?;

        let verdict = self.assess(&state, now, sample.diff);

        metrics::LOCAL_HEIGHT.set(sample.local_height as f64);
        metrics::REFERENCE_HEIGHT.set(sample.reference_height as f64);
        metrics::SYNC_DIFF.set(sample.diff as f64);

        // Progress is measured against the immediately preceding sample, so
        // every evaluation records its result, the stalled one included.
        state.last_diff = Some(sample.diff);
        state.last_check_at = Some(now);
        state.last_sample = Some(sample);

        verdict
    }

    async fn take_sample(&self, reference_url: &str) -> MonitorResult<HeightSample> {
        let reference_height = self.reference.highest_block(reference_url).await?;
        let local_height = self.rpc.block_number().await?;

        // Etherscan can lag a synced node; a negative raw diff means caught up.
        let diff = reference_height.saturating_sub(local_height);

        Ok(HeightSample {
            observed_at: Utc::now(),
            local_height,
            reference_height,
            diff,
        })
    }

    fn assess(&self, state: &MonitorState, now: Instant, diff: u64) -> MonitorResult<ProbeOutcome> {
        if diff < self.config.max_sync_diff {
            info!("Node is synced (diff: {})", diff);
            return Ok(ProbeOutcome::Synced);
        }

        match (state.last_diff, state.last_check_at) {
            (Some(last_diff), Some(last_check_at))
                if last_diff == diff
                    && now.duration_since(last_check_at)
                        >= self.config.update_interval_duration() =>
            {
                error!("Node not syncing. Diff: {}", diff);
                Err(MonitorError::Stalled { diff })
            }
            _ => {
                warn!("Node behind reference (diff: {}) but still progressing", diff);
                Ok(ProbeOutcome::Behind)
            }
        }
    }

    /// Diagnostic snapshot for the status endpoint
    pub async fn status(&self) -> MonitorStatus {
        let state = self.state.lock().await;
        let now = Instant::now();
        let uptime = now.duration_since(state.start_time);

        MonitorStatus {
            started_at: state.started_at,
            uptime_secs: uptime.as_secs(),
            in_grace_period: uptime <= self.config.start_wait_duration(),
            chain_id: state.chain_id,
            reference_url: state.reference_url.map(|s| s.to_string()),
            last_sample: state.last_sample.clone(),
            max_sync_diff: self.config.max_sync_diff,
            update_interval_secs: self.config.update_interval_secs,
        }
    }
}
