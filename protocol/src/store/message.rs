//! The metadata record written to the Tangle.

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::tangle::trytes::{ascii_to_trytes, decode_message, encode_non_ascii};
use crate::tangle::LedgerError;

use super::request::ValidatedRequest;

/// File metadata plus the content identifier of the uploaded bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TangleMessage {
    pub name: String,
    pub description: String,
    pub size: Number,
    pub modified: String,
    pub sha256: String,
    pub storage_id: String,
}

impl TangleMessage {
    pub fn new(request: &ValidatedRequest, storage_id: impl Into<String>) -> Self {
        Self {
            name: request.name.clone(),
            description: request.description.clone(),
            size: request.size.clone(),
            modified: request.modified.clone(),
            sha256: request.sha256.clone(),
            storage_id: storage_id.into(),
        }
    }

    /// JSON, with non-ASCII escaped, encoded as trytes.
    pub fn to_trytes(&self) -> Result<String, LedgerError> {
        let json = serde_json::to_string(self)
            .map_err(|e| LedgerError::InvalidTransaction(e.to_string()))?;
        ascii_to_trytes(&encode_non_ascii(&json))
    }

    /// Decode a message field read back from a transaction.
    pub fn from_trytes(trytes: &str) -> Result<Self, LedgerError> {
        let json = decode_message(trytes)?;
        serde_json::from_str(&json).map_err(|e| LedgerError::InvalidTransaction(e.to_string()))
    }
}
