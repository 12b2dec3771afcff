//! JSON-RPC client for the local Ethereum node

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::error::{MonitorError, MonitorResult};

/// The two node queries the monitor needs, behind a trait so the
/// detector can be exercised against mocks.
#[async_trait]
pub trait EthRpc: Send + Sync {
    /// `net_version`: the chain id, reported as a decimal string
    async fn network_version(&self) -> MonitorResult<u64>;

    /// `eth_blockNumber`: current local block height
    async fn block_number(&self) -> MonitorResult<u64>;
}

/// Parse an Ethereum quantity (`0x`-prefixed hex) into a u64
pub(crate) fn parse_hex_quantity(raw: &str) -> Option<u64> {
    u64::from_str_radix(raw.trim_start_matches("0x"), 16).ok()
}

/// reqwest-based client for the node's HTTP JSON-RPC endpoint
pub struct EthRpcClient {
    rpc_url: String,
    client: reqwest::Client,
}

impl EthRpcClient {
    pub fn new(rpc_url: String, timeout: Duration) -> MonitorResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MonitorError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { rpc_url, client })
    }

    async fn call(&self, method: &str, params: serde_json::Value) -> MonitorResult<serde_json::Value> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        debug!("RPC call {} -> {}", method, self.rpc_url);

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MonitorError::LocalNodeUnavailable(format!("Request failed: {}", e)))?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| MonitorError::LocalNodeUnavailable(format!("Invalid response: {}", e)))?;

        if let Some(error) = json.get("error") {
            return Err(MonitorError::LocalNodeUnavailable(format!(
                "RPC error from {}: {}",
                method, error
            )));
        }

        json.get("result").cloned().ok_or_else(|| {
            MonitorError::LocalNodeUnavailable(format!("Missing result for {}", method))
        })
    }
}

#[async_trait]
impl EthRpc for EthRpcClient {
    async fn network_version(&self) -> MonitorResult<u64> {
        let result = self.call("net_version", serde_json::json!([])).await?;

        result
            .as_str()
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| {
                MonitorError::LocalNodeUnavailable(format!(
                    "Unexpected net_version result: {}",
                    result
                ))
            })
    }

    async fn block_number(&self) -> MonitorResult<u64> {
        let result = self.call("eth_blockNumber", serde_json::json!([])).await?;

        result
            .as_str()
            .and_then(parse_hex_quantity)
            .ok_or_else(|| {
                MonitorError::LocalNodeUnavailable(format!(
                    "Unexpected eth_blockNumber result: {}",
                    result
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(server: &mockito::ServerGuard) -> EthRpcClient {
        EthRpcClient::new(server.url(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_parse_hex_quantity() {
        assert_eq!(parse_hex_quantity("0x10"), Some(16));
        assert_eq!(parse_hex_quantity("0x0"), Some(0));
        assert_eq!(parse_hex_quantity("not hex"), None);
        assert_eq!(parse_hex_quantity(""), None);
    }

    #[tokio::test]
    async fn test_network_version() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"3"}"#)
            .create_async()
            .await;

        let version = client_for(&server).network_version().await.unwrap();
        assert_eq!(version, 3);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_block_number_parses_hex() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0x4b7"}"#)
            .create_async()
            .await;

        let height = client_for(&server).block_number().await.unwrap();
        assert_eq!(height, 1207);
    }

    #[tokio::test]
    async fn test_rpc_error_member_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"method not found"}}"#)
            .create_async()
            .await;

        let err = client_for(&server).block_number().await.unwrap_err();
        assert!(matches!(err, MonitorError::LocalNodeUnavailable(_)));
    }

    #[tokio::test]
    async fn test_unreachable_node() {
        // Port 9 is discard; nothing listens there in the test environment.
        let client =
            EthRpcClient::new("http://127.0.0.1:9".to_string(), Duration::from_millis(200))
                .unwrap();

        let err = client.block_number().await.unwrap_err();
        assert!(matches!(err, MonitorError::LocalNodeUnavailable(_)));
    }
}
