//! Etherscan reference-height client and network mapping

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::error::{MonitorError, MonitorResult};
use crate::rpc::parse_hex_quantity;

/// Etherscan API endpoints per chain id (as reported by `net_version`)
const ETHERSCAN_API_URLS: &[(u64, &str)] = &[
    (1, "https://api.etherscan.io/api"),
    (3, "http://ropsten.etherscan.io/api"),
    (4, "http://rinkeby.etherscan.io/api"),
];

/// Look up the Etherscan API base URL for a chain id
pub fn reference_api_url(chain_id: u64) -> Option<&'static str> {
    ETHERSCAN_API_URLS
        .iter()
        .find(|(id, _)| *id == chain_id)
        .map(|(_, url)| *url)
}

/// External source for the authoritative chain height
#[async_trait]
pub trait ReferenceApi: Send + Sync {
    /// Highest block height the reference source knows about
    async fn highest_block(&self, api_url: &str) -> MonitorResult<u64>;
}

/// reqwest-based Etherscan proxy-API client
pub struct EtherscanClient {
    api_key: String,
    client: reqwest::Client,
}

impl EtherscanClient {
    pub fn new(api_key: String, timeout: Duration) -> MonitorResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MonitorError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { api_key, client })
    }
}

#[async_trait]
impl ReferenceApi for EtherscanClient {
    async fn highest_block(&self, api_url: &str) -> MonitorResult<u64> {
        debug!("Fetching reference height from {}", api_url);

        let response = self
            .client
            .get(api_url)
            .query(&[
                ("module", "proxy"),
                ("action", "eth_blockNumber"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| MonitorError::ReferenceUnavailable(format!("Request failed: {}", e)))?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| MonitorError::ReferenceUnavailable(format!("Invalid response: {}", e)))?;

        json.get("result")
            .and_then(|v| v.as_str())
            .and_then(parse_hex_quantity)
            .ok_or_else(|| {
                MonitorError::ReferenceUnavailable(format!("Unparseable payload: {}", json))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client() -> EtherscanClient {
        EtherscanClient::new("testkey".to_string(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_reference_api_url_mapping() {
        assert_eq!(reference_api_url(1), Some("https://api.etherscan.io/api"));
        assert_eq!(reference_api_url(3), Some("http://ropsten.etherscan.io/api"));
        assert_eq!(reference_api_url(4), Some("http://rinkeby.etherscan.io/api"));
        assert_eq!(reference_api_url(5), None);
        assert_eq!(reference_api_url(0), None);
    }

    #[tokio::test]
    async fn test_highest_block() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("module".into(), "proxy".into()),
                Matcher::UrlEncoded("action".into(), "eth_blockNumber".into()),
                Matcher::UrlEncoded("apikey".into(), "testkey".into()),
            ]))
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":83,"result":"0x100"}"#)
            .create_async()
            .await;

        let url = format!("{}/api", server.url());
        let height = client().highest_block(&url).await.unwrap();
        assert_eq!(height, 256);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_result_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api")
            .match_query(Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"0","message":"NOTOK"}"#)
            .create_async()
            .await;

        let url = format!("{}/api", server.url());
        let err = client().highest_block(&url).await.unwrap_err();
        assert!(matches!(err, MonitorError::ReferenceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_non_hex_result_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api")
            .match_query(Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":83,"result":"Max rate limit reached"}"#)
            .create_async()
            .await;

        let url = format!("{}/api", server.url());
        let err = client().highest_block(&url).await.unwrap_err();
        assert!(matches!(err, MonitorError::ReferenceUnavailable(_)));
    }
}
