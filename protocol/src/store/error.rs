//! Failure taxonomy of the store pipeline.

use std::error::Error as _;

use thiserror::Error;

use crate::config::MAX_UPLOAD_BYTES;
use crate::ipfs::{EndpointError, StorageError};
use crate::tangle::LedgerError;

/// Why an upload was rejected on size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SizeError {
    #[error("The file must be greater than 0 bytes in length.")]
    Empty,

    #[error(
        "The file is too large for this demonstration, it should be less than {max} bytes."
    )]
    TooLarge { max: usize },
}

impl SizeError {
    /// Apply the upload size policy to a decoded payload length.
    pub fn check(len: usize) -> Result<(), SizeError> {
        if len >= MAX_UPLOAD_BYTES {
            Err(SizeError::TooLarge {
                max: MAX_UPLOAD_BYTES,
            })
        } else if len == 0 {
            Err(SizeError::Empty)
        } else {
            Ok(())
        }
    }
}

/// Every way a store request can fail, one variant per pipeline stage.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("The parameter '{field}' {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("The ledger node is not available")]
    Availability(#[source] LedgerError),

    #[error(transparent)]
    Size(#[from] SizeError),

    #[error(
        "The sha256 for the file is incorrect '{expected}' was sent but it has been calculated as '{actual}'"
    )]
    ChecksumMismatch { expected: String, actual: String },

    #[error("The storage provider URL is invalid")]
    ConfigParse(#[source] EndpointError),

    #[error("Uploading to storage failed")]
    Upload(#[source] StorageError),

    #[error("Composing the transaction failed")]
    TransactionCompose(#[source] LedgerError),

    #[error("Submitting the transaction failed")]
    TransactionSubmit(#[source] LedgerError),
}

impl StoreError {
    /// Stable label for the failure kind, used as a metrics label and in
    /// logs.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Validation { .. } => "validation",
            StoreError::Availability(_) => "availability",
            StoreError::Size(_) => "size",
            StoreError::ChecksumMismatch { .. } => "checksum",
            StoreError::ConfigParse(_) => "config",
            StoreError::Upload(_) => "upload",
            StoreError::TransactionCompose(_) => "compose",
            StoreError::TransactionSubmit(_) => "submit",
        }
    }

    /// The error followed by each of its causes, `: `-separated.
    pub fn render_chain(&self) -> String {
        let mut out = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            out.push_str(": ");
            out.push_str(&cause.to_string());
            source = cause.source();
        }
        out
    }

    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        StoreError::Validation {
            field,
            reason: reason.into(),
        }
    }
}
