//! Request and response bodies of the store operation.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use super::error::StoreError;

/// Standard alphabet, padding optional.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A store request as received.
///
/// Fields are kept as raw JSON so that a missing or mistyped field is
/// reported by name from [`StoreRequest::validate`] instead of failing
/// deserialization as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreRequest {
    #[serde(default)]
    pub name: Value,
    #[serde(default)]
    pub description: Value,
    #[serde(default)]
    pub size: Value,
    #[serde(default)]
    pub modified: Value,
    #[serde(default)]
    pub sha256: Value,
    /// Base64 file content.
    #[serde(default)]
    pub data: Value,
}

/// A request whose fields all have the right shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub name: String,
    pub description: String,
    /// Declared size, echoed into the ledger message as given.
    pub size: Number,
    pub modified: String,
    pub sha256: String,
    pub data: String,
}

impl StoreRequest {
    /// Build a well-formed request, e.g. from a local file.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        size: u64,
        modified: impl Into<String>,
        sha256: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            name: Value::String(name.into()),
            description: Value::String(description.into()),
            size: Value::Number(size.into()),
            modified: Value::String(modified.into()),
            sha256: Value::String(sha256.into()),
            data: Value::String(data.into()),
        }
    }

    /// Check field presence and types, in declaration order. The first
    /// offending field is reported.
    pub fn validate(&self) -> Result<ValidatedRequest, StoreError> {
        let name = non_empty_string(&self.name, "name")?;
        let description = non_empty_string(&self.description, "description")?;
        let size = match &self.size {
            Value::Number(n) => n.clone(),
            _ => return Err(StoreError::validation("size", "must be a number")),
        };
        let modified = non_empty_string(&self.modified, "modified")?;
        let sha256 = non_empty_string(&self.sha256, "sha256")?;
        let data = non_empty_string(&self.data, "data")?;

        Ok(ValidatedRequest {
            name,
            description,
            size,
            modified,
            sha256,
            data,
        })
    }
}

impl ValidatedRequest {
    /// Decode the base64 payload. Whitespace anywhere (line-wrapped
    /// encoder output) and trailing padding are ignored, so `"="` decodes
    /// to nothing. URL-safe `-` and `_` are read as `+` and `/`.
    pub fn decode_data(&self) -> Result<Vec<u8>, StoreError> {
        let normalized: String = self
            .data
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .map(|c| match c {
                '-' => '+',
                '_' => '/',
                other => other,
            })
            .collect();
        PAYLOAD_ENGINE
            .decode(normalized.trim_end_matches('='))
            .map_err(|e| StoreError::validation("data", format!("is not valid base64: {}", e)))
    }
}

fn non_empty_string(value: &Value, field: &'static str) -> Result<String, StoreError> {
    match value {
        Value::String(s) if !s.is_empty() => Ok(s.clone()),
        _ => Err(StoreError::validation(field, "must be a non-empty string")),
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreReceipt {
    /// Hash of the tail transaction of the attached bundle.
    pub transaction_hash: String,
    /// Content identifier returned by the storage service.
    pub storage_id: String,
    /// Decoded payload length.
    pub stored_bytes: usize,
}

/// The response body. Identifiers are present exactly when `success` is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_id: Option<String>,
}

impl StoreResponse {
    pub fn success(receipt: StoreReceipt) -> Self {
        Self {
            success: true,
            message: "OK".into(),
            transaction_hash: Some(receipt.transaction_hash),
            storage_id: Some(receipt.storage_id),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            transaction_hash: None,
            storage_id: None,
        }
    }
}
