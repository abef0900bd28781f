//! End-to-end tests for the store pipeline.
//!
//! The first group runs the real HTTP clients against mock IPFS and node
//! servers, so every byte that would cross the network is produced by the
//! library itself. The second group swaps in in-memory collaborators to
//! check behavior that mock servers make awkward: concurrency and
//! repeated submissions.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use mockito::Matcher;
use parking_lot::Mutex;
use serde_json::{json, Value};

use tangle_store::config::{IpfsConfig, NodeConfig, StoreConfig};
use tangle_store::crypto::sha256_hex;
use tangle_store::ipfs::{AddedContent, IpfsHttpClient, IpfsOptions, StorageClient, StorageError};
use tangle_store::store::{StoreRequest, StoreRequestHandler, TangleMessage};
use tangle_store::tangle::{LedgerClient, LedgerError, NodeClient, NodeInfo, Transaction};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn request_for(data: &[u8]) -> StoreRequest {
    StoreRequest::new(
        "report.txt",
        "quarterly report",
        data.len() as u64,
        "2026-03-31T12:00:00Z",
        sha256_hex(data),
        STANDARD.encode(data),
    )
}

fn config(node_url: &str, ipfs_url: &str) -> Arc<StoreConfig> {
    Arc::new(StoreConfig {
        seed: "PIPELINETESTSEED".into(),
        node: NodeConfig {
            provider: node_url.into(),
            depth: 3,
            mwm: 9,
        },
        ipfs: IpfsConfig {
            provider: format!("{}/api/v0/", ipfs_url),
            token: Some("dXNlcjpwYXNz".into()),
        },
    })
}

fn node_info() -> String {
    json!({
        "appName": "IRI",
        "appVersion": "1.8.6",
        "latestMilestoneIndex": 1_500_000,
        "latestSolidSubtangleMilestoneIndex": 1_500_000
    })
    .to_string()
}

/// Mock every node command the pipeline issues. `attachToTangle` echoes the
/// trytes it was given, as a node with zero-difficulty PoW would.
async fn mock_node(server: &mut mockito::ServerGuard) -> Vec<mockito::Mock> {
    let info = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({"command": "getNodeInfo"})))
        .with_body(node_info())
        .create_async()
        .await;
    let tips = server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({
            "command": "getTransactionsToApprove",
            "depth": 3
        })))
        .with_body(
            json!({
                "trunkTransaction": "T".repeat(81),
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
            "minWeightMagnitude": 9
        })))
        .with_body_from_request(|request| {
            let body: Value = serde_json::from_slice(request.body().unwrap()).unwrap();
            json!({"trytes": body["trytes"]}).to_string().into_bytes()
        })
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
    vec![info, tips, attach, store, broadcast]
}

fn http_handler(config: Arc<StoreConfig>) -> StoreRequestHandler<NodeClient, IpfsHttpClient> {
    let ledger = NodeClient::new(config.node.provider.clone(), Duration::from_secs(10)).unwrap();
    let storage = IpfsHttpClient::new(Duration::from_secs(10)).unwrap();
    StoreRequestHandler::new(config, ledger, storage)
}

// ---------------------------------------------------------------------------
// Over HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stores_file_over_http() {
    let mut node = mockito::Server::new_async().await;
    let node_mocks = mock_node(&mut node).await;

    let mut ipfs = mockito::Server::new_async().await;
    let upload = ipfs
        .mock("POST", "/api/v0/add")
        .match_header("authorization", "Basic dXNlcjpwYXNz")
        .with_body(r#"{"Name":"file","Hash":"QmReportHash","Size":"108"}"#)
        .create_async()
        .await;

    let handler = http_handler(config(&node.url(), &ipfs.url()));
    let data = vec![b'x'; 100];
    let response = handler.handle(&request_for(&data)).await;

    assert!(response.success, "failed: {}", response.message);
    assert_eq!(response.message, "OK");
    assert_eq!(response.storage_id.as_deref(), Some("QmReportHash"));
    assert_eq!(response.transaction_hash.as_ref().map(String::len), Some(81));

    upload.assert_async().await;
    for mock in node_mocks {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn stored_message_points_at_upload() {
    let mut node = mockito::Server::new_async().await;
    let _node_mocks = mock_node(&mut node).await;
    let mut ipfs = mockito::Server::new_async().await;
    let _upload = ipfs
        .mock("POST", "/api/v0/add")
        .with_body(r#"{"Name":"file","Hash":"QmPointer","Size":"13"}"#)
        .create_async()
        .await;

    let cfg = config(&node.url(), &ipfs.url());
    let handler = http_handler(cfg.clone());
    let outcome = handler.execute(&request_for(b"hello")).await;
    let receipt = outcome.result.unwrap();

    // The compose step names the receive address derived from the seed.
    let address = handler
        .ledger()
        .generate_address(&cfg.seed, 0, 2)
        .unwrap();
    assert_eq!(address.len(), 81);
    assert_eq!(receipt.storage_id, "QmPointer");
    assert!(outcome.trace.iter().any(|e| e.detail.contains(&address)));
}

#[tokio::test]
async fn upload_outage_reports_failure_without_touching_ledger() {
    let mut node = mockito::Server::new_async().await;
    let _info = node
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({"command": "getNodeInfo"})))
        .with_body(node_info())
        .create_async()
        .await;
    let attach = node
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({"command": "attachToTangle"})))
        .expect(0)
        .create_async()
        .await;

    let mut ipfs = mockito::Server::new_async().await;
    let _upload = ipfs
        .mock("POST", "/api/v0/add")
        .with_status(503)
        .with_body("service unavailable")
        .create_async()
        .await;

    let handler = http_handler(config(&node.url(), &ipfs.url()));
    let response = handler.handle(&request_for(b"hello")).await;

    assert!(!response.success);
    assert!(response.transaction_hash.is_none());
    assert!(response.message.contains("503"));
    attach.assert_async().await;
}

#[tokio::test]
async fn unreachable_node_fails_availability() {
    let handler = http_handler(config("http://127.0.0.1:1", "http://127.0.0.1:1"));
    let outcome = handler.execute(&request_for(b"hello")).await;
    assert_eq!(outcome.result.unwrap_err().kind(), "availability");
}

// ---------------------------------------------------------------------------
// In Memory
// ---------------------------------------------------------------------------

/// Ledger that "attaches" by stamping an increasing attachment timestamp,
/// so every submission yields a fresh transaction hash.
#[derive(Default)]
struct MemoryLedger {
    clock: AtomicI64,
    messages: Mutex<Vec<TangleMessage>>,
}

#[async_trait]
impl LedgerClient for MemoryLedger {
    async fn get_node_info(&self) -> Result<NodeInfo, LedgerError> {
        Ok(NodeInfo {
            app_name: "memory".into(),
            app_version: "0".into(),
            latest_milestone: String::new(),
            latest_milestone_index: 1,
            latest_solid_subtangle_milestone: String::new(),
            latest_solid_subtangle_milestone_index: 1,
        })
    }

    async fn send_trytes(
        &self,
        trytes: &[String],
        _depth: u32,
        _mwm: u8,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let mut attached = Vec::with_capacity(trytes.len());
        for t in trytes {
            let mut tx = Transaction::from_trytes(t)?;
            tx.attachment_timestamp = self.clock.fetch_add(1, Ordering::SeqCst) + 1;
            let tx = Transaction::from_trytes(&tx.to_trytes()?)?;
            self.messages
                .lock()
                .push(TangleMessage::from_trytes(&tx.signature_message_fragment)?);
            attached.push(tx);
        }
        Ok(attached)
    }
}

/// Storage that hands out sequential identifiers.
#[derive(Default)]
struct MemoryStorage {
    uploads: Mutex<Vec<Bytes>>,
}

#[async_trait]
impl StorageClient for MemoryStorage {
    async fn add(
        &self,
        _options: &IpfsOptions,
        data: Bytes,
    ) -> Result<AddedContent, StorageError> {
        let mut uploads = self.uploads.lock();
        uploads.push(data);
        Ok(AddedContent {
            hash: format!("QmMemory{}", uploads.len()),
            name: "file".into(),
            size: None,
        })
    }
}

fn memory_handler() -> Arc<StoreRequestHandler<MemoryLedger, MemoryStorage>> {
    Arc::new(StoreRequestHandler::new(
        config("http://node.invalid:14265", "http://ipfs.invalid:5001"),
        MemoryLedger::default(),
        MemoryStorage::default(),
    ))
}

#[tokio::test]
async fn identical_requests_are_not_deduplicated() {
    let handler = memory_handler();
    let request = request_for(b"same bytes");

    let first = handler.handle(&request).await;
    let second = handler.handle(&request).await;

    assert!(first.success && second.success);
    assert_ne!(first.storage_id, second.storage_id);
    assert_ne!(first.transaction_hash, second.transaction_hash);
}

#[tokio::test]
async fn ledger_message_carries_request_metadata() {
    let handler = memory_handler();
    let response = handler.handle(&request_for(b"hello")).await;
    assert!(response.success);

    let messages = handler.ledger().messages.lock();
    assert_eq!(messages.len(), 1);
    let message = &messages[0];
    assert_eq!(message.name, "report.txt");
    assert_eq!(message.description, "quarterly report");
    assert_eq!(message.sha256, sha256_hex(b"hello"));
    assert_eq!(Some(message.storage_id.clone()), response.storage_id);
}

#[tokio::test]
async fn concurrent_requests_share_nothing_mutable() {
    let handler = memory_handler();
    let mut tasks = Vec::new();
    for i in 0..8u8 {
        let handler = Arc::clone(&handler);
        tasks.push(tokio::spawn(async move {
            let data = vec![i; 64];
            handler.handle(&request_for(&data)).await
        }));
    }

    let mut ids = Vec::new();
    for task in tasks {
        let response = task.await.unwrap();
        assert!(response.success, "failed: {}", response.message);
        ids.push(response.storage_id.unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8);
}

#[tokio::test]
async fn validation_failures_never_reach_collaborators() {
    let handler = memory_handler();
    let cases = [
        json!({"description": "d", "size": 1, "modified": "m", "sha256": "s", "data": "aA=="}),
        json!({
            "name": "n",
            "description": "d",
            "size": "1",
            "modified": "m",
            "sha256": "s",
            "data": "aA=="
        }),
        json!({"name": "n", "description": "d", "size": 1, "modified": "m", "sha256": "s"}),
    ];
    for (case, field) in cases.into_iter().zip(["name", "size", "data"]) {
        let request: StoreRequest = serde_json::from_value(case).unwrap();
        let response = handler.handle(&request).await;
        assert!(!response.success);
        assert!(response.message.contains(field), "{}", response.message);
    }

    let empty = StoreRequest::new("n", "d", 0, "m", sha256_hex(b""), "=");
    let response = handler.handle(&empty).await;
    assert!(response.message.contains("greater than 0 bytes"));

    let too_big = vec![0u8; 10_240];
    let response = handler.handle(&request_for(&too_big)).await;
    assert!(response.message.contains("too large"));

    assert!(handler.ledger().messages.lock().is_empty());
}
