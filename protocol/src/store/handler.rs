//! # Store Pipeline
//!
//! ```text
//! request ─► validate ─► node check ─► decode ─► size ─► sha256
//!                                                          │
//!   response ◄─ submit ◄─ compose ◄─ message ◄─ upload ◄───┘
//! ```
//!
//! Steps run strictly in order and the first failure ends the request.
//! Nothing is retried and nothing is undone: if submission fails after the
//! upload succeeded, the uploaded content stays where it is.

use std::sync::Arc;

use bytes::Bytes;
use tracing::Instrument;

use crate::config::{StoreConfig, ADDRESS_INDEX, PLACEHOLDER_SEED, SECURITY_LEVEL};
use crate::crypto::verify_sha256_hex;
use crate::ipfs::{IpfsOptions, StorageClient, StorageError};
use crate::tangle::{LedgerClient, LedgerError, Transfer};

use super::error::{SizeError, StoreError};
use super::message::TangleMessage;
use super::request::{StoreReceipt, StoreRequest, StoreResponse};
use super::trace::{render_entries, StepEntry, StepLog};

/// Result of one run, with the steps that were taken.
#[derive(Debug)]
pub struct StoreOutcome {
    pub result: Result<StoreReceipt, StoreError>,
    pub trace: Vec<StepEntry>,
}

impl StoreOutcome {
    /// Collapse into the response body. Failures carry the error, its
    /// causes, and the step trace.
    pub fn into_response(self) -> StoreResponse {
        match self.result {
            Ok(receipt) => StoreResponse::success(receipt),
            Err(err) => {
                let mut message = err.render_chain();
                let trace = render_entries(&self.trace);
                if !trace.is_empty() {
                    message.push('\n');
                    message.push_str(&trace);
                }
                StoreResponse::failure(message)
            }
        }
    }
}

/// Runs store requests against a ledger and a storage service.
///
/// Holds only immutable configuration and the two clients, so one instance
/// serves any number of concurrent requests.
pub struct StoreRequestHandler<L, S> {
    config: Arc<StoreConfig>,
    ledger: L,
    storage: S,
}

impl<L: LedgerClient, S: StorageClient> StoreRequestHandler<L, S> {
    pub fn new(config: Arc<StoreConfig>, ledger: L, storage: S) -> Self {
        Self {
            config,
            ledger,
            storage,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Run the pipeline and return a response. Never fails.
    pub async fn handle(&self, request: &StoreRequest) -> StoreResponse {
        self.execute(request).await.into_response()
    }

    /// Run the pipeline, keeping the typed error.
    pub async fn execute(&self, request: &StoreRequest) -> StoreOutcome {
        let span = tracing::info_span!("ipfs_store");
        async {
            let mut log = StepLog::new();
            let result = self.run(request, &mut log).await;
            match &result {
                Ok(_) => log.succeed(),
                Err(e) => log.fail(e.kind()),
            }
            StoreOutcome {
                result,
                trace: log.entries().to_vec(),
            }
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        request: &StoreRequest,
        log: &mut StepLog,
    ) -> Result<StoreReceipt, StoreError> {
        let request = request.validate()?;
        log.step("validate", format!("name={} size={}", request.name, request.size));

        let info = self
            .ledger
            .check_node_availability(true)
            .await
            .map_err(StoreError::Availability)?;
        log.step(
            "node",
            format!(
                "{} {} synced at milestone {}",
                info.app_name, info.app_version, info.latest_milestone_index
            ),
        );

        let data = request.decode_data()?;
        log.step("decode", format!("{} bytes", data.len()));

        SizeError::check(data.len())?;

        verify_sha256_hex(&data, &request.sha256).map_err(|actual| {
            StoreError::ChecksumMismatch {
                expected: request.sha256.clone(),
                actual,
            }
        })?;
        log.step("checksum", "sha256 matches");

        let options =
            IpfsOptions::from_config(&self.config.ipfs).map_err(StoreError::ConfigParse)?;
        log.step("storage", format!("endpoint {}", options.endpoint));

        let stored_bytes = data.len();
        let added = self
            .storage
            .add(&options, Bytes::from(data))
            .await
            .map_err(StoreError::Upload)?;
        if added.hash.is_empty() {
            return Err(StoreError::Upload(StorageError::MalformedResponse(
                "no content identifier returned".into(),
            )));
        }
        log.step("upload", format!("storage id {}", added.hash));

        let message = TangleMessage::new(&request, added.hash.clone())
            .to_trytes()
            .map_err(StoreError::TransactionCompose)?;

        let address = self
            .ledger
            .generate_address(&self.config.seed, ADDRESS_INDEX, SECURITY_LEVEL)
            .map_err(StoreError::TransactionCompose)?;
        let transfer = Transfer::zero_value(address.clone(), message);
        let trytes = self
            .ledger
            .prepare_transfers(PLACEHOLDER_SEED, &[transfer])
            .map_err(StoreError::TransactionCompose)?;
        log.step(
            "compose",
            format!("{} transaction(s) to {}", trytes.len(), address),
        );

        let transactions = self
            .ledger
            .send_trytes(&trytes, self.config.node.depth, self.config.node.mwm)
            .await
            .map_err(StoreError::TransactionSubmit)?;
        let tail = transactions
            .iter()
            .find(|tx| tx.is_tail())
            .or_else(|| transactions.first())
            .ok_or(StoreError::TransactionSubmit(LedgerError::EmptyBundle))?;
        log.step("submit", format!("transaction {}", tail.hash));

        Ok(StoreReceipt {
            transaction_hash: tail.hash.clone(),
            storage_id: added.hash,
            stored_bytes,
        })
    }
}
