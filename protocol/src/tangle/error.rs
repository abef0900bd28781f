//! Errors from the Tangle side: encoding, composition, and the node API.

use thiserror::Error;

use crate::crypto::TernaryError;

/// Errors raised while composing or submitting Tangle transactions.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Ternary(#[from] TernaryError),

    #[error("invalid seed: {0}")]
    InvalidSeed(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid security level {0}, expected 1 to 3")]
    InvalidSecurity(u8),

    #[error("invalid tag: {0}")]
    InvalidTag(String),

    #[error("message is not valid trytes")]
    InvalidMessage,

    #[error("character {0:?} cannot be encoded as trytes")]
    NonAscii(char),

    #[error("tryte string of odd length {0} cannot be decoded")]
    OddLength(usize),

    #[error("value transfers need inputs, only zero-value transfers are supported")]
    ValueTransfer,

    #[error("no transfers to prepare")]
    EmptyBundle,

    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("node returned status {status}: {message}")]
    Node { status: u16, message: String },

    #[error("malformed node response: {0}")]
    MalformedResponse(String),

    #[error("node is not synced (latest milestone {latest}, latest solid {solid})")]
    NotSynced { latest: u64, solid: u64 },
}
