//! Ledger node client.
//!
//! IRI-compatible nodes expose a single JSON endpoint: every call is a
//! `POST` with a `command` field and the `X-IOTA-API-Version` header.
//! Errors come back as `{"error": "..."}` with a non-2xx status.
//!
//! [`LedgerClient`] is the seam the store pipeline talks to. Address
//! derivation and bundle preparation are local computations with default
//! implementations; only the network calls must be provided.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::IOTA_API_VERSION;

use super::address;
use super::bundle::{self, Transfer};
use super::error::LedgerError;
use super::transaction::Transaction;

/// Subset of `getNodeInfo` the pipeline looks at.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    #[serde(default)]
    pub app_name: String,
    #[serde(default)]
    pub app_version: String,
    #[serde(default)]
    pub latest_milestone: String,
    pub latest_milestone_index: u64,
    #[serde(default)]
    pub latest_solid_subtangle_milestone: String,
    pub latest_solid_subtangle_milestone_index: u64,
}

impl NodeInfo {
    /// A node is synced when its latest solid milestone is its latest.
    pub fn is_synced(&self) -> bool {
        self.latest_milestone_index == self.latest_solid_subtangle_milestone_index
    }
}

/// Ledger capabilities used by the store pipeline.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn get_node_info(&self) -> Result<NodeInfo, LedgerError>;

    /// Attach and broadcast `trytes` (head first), returning the attached
    /// transactions.
    async fn send_trytes(
        &self,
        trytes: &[String],
        depth: u32,
        mwm: u8,
    ) -> Result<Vec<Transaction>, LedgerError>;

    /// Fail unless the node answers, and with `check_sync` unless it is
    /// also synced.
    async fn check_node_availability(&self, check_sync: bool) -> Result<NodeInfo, LedgerError> {
        let info = self.get_node_info().await?;
        if check_sync && !info.is_synced() {
            return Err(LedgerError::NotSynced {
                latest: info.latest_milestone_index,
                solid: info.latest_solid_subtangle_milestone_index,
            });
        }
        Ok(info)
    }

    fn generate_address(
        &self,
        seed: &str,
        index: u64,
        security: u8,
    ) -> Result<String, LedgerError> {
        address::generate_address(seed, index, security)
    }

    fn prepare_transfers(
        &self,
        seed: &str,
        transfers: &[Transfer],
    ) -> Result<Vec<String>, LedgerError> {
        let timestamp = chrono::Utc::now().timestamp().max(0) as u64;
        bundle::prepare_transfers(seed, transfers, timestamp)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionsToApprove {
    trunk_transaction: String,
    branch_transaction: String,
}

#[derive(Debug, Deserialize)]
struct AttachedTrytes {
    trytes: Vec<String>,
}

/// [`LedgerClient`] speaking the node HTTP API.
#[derive(Debug, Clone)]
pub struct NodeClient {
    http: reqwest::Client,
    provider: String,
    timeout: Duration,
}

impl NodeClient {
    pub fn new(provider: impl Into<String>, timeout: Duration) -> Result<Self, LedgerError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Client(e.to_string()))?;
        Ok(Self {
            http,
            provider: provider.into(),
            timeout,
        })
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    async fn command<T: DeserializeOwned>(&self, body: Value) -> Result<T, LedgerError> {
        let name = body["command"].as_str().unwrap_or("unknown").to_string();
        tracing::debug!(command = %name, provider = %self.provider, "node command");

        let response = self
            .http
            .post(&self.provider)
            .header("X-IOTA-API-Version", IOTA_API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v["error"].as_str().map(str::to_string))
                .unwrap_or(text);
            return Err(LedgerError::Node {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| LedgerError::MalformedResponse(format!("{}: {}", name, e)))
    }

    fn map_send_error(&self, e: reqwest::Error) -> LedgerError {
        if e.is_timeout() {
            LedgerError::Timeout(self.timeout.as_secs())
        } else {
            LedgerError::Network(e.to_string())
        }
    }

    pub async fn get_transactions_to_approve(
        &self,
        depth: u32,
    ) -> Result<(String, String), LedgerError> {
        let tips: TransactionsToApprove = self
            .command(json!({"command": "getTransactionsToApprove", "depth": depth}))
            .await?;
        Ok((tips.trunk_transaction, tips.branch_transaction))
    }

    pub async fn attach_to_tangle(
        &self,
        trunk: &str,
        branch: &str,
        mwm: u8,
        trytes: &[String],
    ) -> Result<Vec<String>, LedgerError> {
        let attached: AttachedTrytes = self
            .command(json!({
                "command": "attachToTangle",
                "trunkTransaction": trunk,
                "branchTransaction": branch,
                "minWeightMagnitude": mwm,
                "trytes": trytes,
            }))
            .await?;
        Ok(attached.trytes)
    }

    pub async fn store_transactions(&self, trytes: &[String]) -> Result<(), LedgerError> {
        self.command::<Value>(json!({"command": "storeTransactions", "trytes": trytes}))
            .await?;
        Ok(())
    }

    pub async fn broadcast_transactions(&self, trytes: &[String]) -> Result<(), LedgerError> {
        self.command::<Value>(json!({"command": "broadcastTransactions", "trytes": trytes}))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl LedgerClient for NodeClient {
    async fn get_node_info(&self) -> Result<NodeInfo, LedgerError> {
        self.command(json!({"command": "getNodeInfo"})).await
    }

    async fn send_trytes(
        &self,
        trytes: &[String],
        depth: u32,
        mwm: u8,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let (trunk, branch) = self.get_transactions_to_approve(depth).await?;
        let attached = self.attach_to_tangle(&trunk, &branch, mwm, trytes).await?;
        self.store_transactions(&attached).await?;
        self.broadcast_transactions(&attached).await?;

        let transactions = attached
            .iter()
            .map(|t| Transaction::from_trytes(t))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::info!(
            transactions = transactions.len(),
            bundle = %transactions.first().map(|t| t.bundle.as_str()).unwrap_or(""),
            "bundle attached and broadcast"
        );
        Ok(transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HASH_LENGTH_TRYTES, PLACEHOLDER_SEED};
    use crate::crypto::ternary::pad_trytes;
    use mockito::Matcher;

    fn node_info_body(latest: u64, solid: u64) -> String {
        json!({
            "appName": "IRI",
            "appVersion": "1.8.6",
            "latestMilestone": "9".repeat(81),
            "latestMilestoneIndex": latest,
            "latestSolidSubtangleMilestone": "9".repeat(81),
            "latestSolidSubtangleMilestoneIndex": solid,
            "neighbors": 4,
        })
        .to_string()
    }

    fn client_for(server: &mockito::ServerGuard) -> NodeClient {
        NodeClient::new(server.url(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn node_info_sends_api_version_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("x-iota-api-version", "1")
            .match_body(Matcher::PartialJson(json!({"command": "getNodeInfo"})))
            .with_status(200)
            .with_body(node_info_body(100, 100))
            .create_async()
            .await;

        let info = client_for(&server).get_node_info().await.unwrap();
        assert_eq!(info.app_name, "IRI");
        assert!(info.is_synced());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn availability_check_detects_unsynced_node() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(node_info_body(100, 97))
            .create_async()
            .await;

        let client = client_for(&server);
        assert!(client.check_node_availability(false).await.is_ok());
        assert!(matches!(
            client.check_node_availability(true).await,
            Err(LedgerError::NotSynced {
                latest: 100,
                solid: 97
            })
        ));
    }

    #[tokio::test]
    async fn node_errors_carry_the_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(400)
            .with_body(r#"{"error":"Invalid depth input","duration":0}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .get_transactions_to_approve(0)
            .await
            .unwrap_err();
        match err {
            LedgerError::Node { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid depth input");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn unreachable_node_is_a_network_error() {
        let client = NodeClient::new("http://127.0.0.1:1", Duration::from_secs(5)).unwrap();
        let err = client.check_node_availability(true).await.unwrap_err();
        assert!(matches!(err, LedgerError::Network(_) | LedgerError::Timeout(_)));
    }

    #[tokio::test]
    async fn send_trytes_runs_the_full_sequence() {
        let receiver = pad_trytes("RECEIVER", HASH_LENGTH_TRYTES);
        let client = NodeClient::new("http://unused", Duration::from_secs(5)).unwrap();
        let trytes = client
            .prepare_transfers(PLACEHOLDER_SEED, &[Transfer::zero_value(receiver, "MESSAGE")])
            .unwrap();

        let mut server = mockito::Server::new_async().await;
        let tips = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "command": "getTransactionsToApprove",
                "depth": 3
            })))
            .with_body(
                json!({
                    "trunkTransaction": "A".repeat(81),
                    "branchTransaction": "B".repeat(81)
                })
                .to_string(),
            )
            .create_async()
            .await;
        let attach = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "command": "attachToTangle",
                "trunkTransaction": "A".repeat(81),
                "minWeightMagnitude": 9
            })))
            .with_body(json!({"trytes": trytes}).to_string())
            .create_async()
            .await;
        let store = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({"command": "storeTransactions"})))
            .with_body("{}")
            .create_async()
            .await;
        let broadcast = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({"command": "broadcastTransactions"})))
            .with_body("{}")
            .create_async()
            .await;

        let transactions = client_for(&server)
            .send_trytes(&trytes, 3, 9)
            .await
            .unwrap();

        assert_eq!(transactions.len(), 1);
        assert!(transactions[0].is_tail());
        assert_eq!(transactions[0].hash.len(), HASH_LENGTH_TRYTES);
        tips.assert_async().await;
        attach.assert_async().await;
        store.assert_async().await;
        broadcast.assert_async().await;
    }

    #[test]
    fn default_address_derivation_is_deterministic() {
        let client = NodeClient::new("http://unused", Duration::from_secs(5)).unwrap();
        let a = client.generate_address("SEED", 0, 2).unwrap();
        assert_eq!(a, address::generate_address("SEED", 0, 2).unwrap());
    }
}
