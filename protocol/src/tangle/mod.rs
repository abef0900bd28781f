//! # Tangle Ledger
//!
//! Everything needed to put a zero-value message on the Tangle:
//!
//! - [`trytes`]: text to tryte encoding for message payloads.
//! - [`address`]: deterministic address derivation from a seed.
//! - [`transaction`]: the 2673-tryte transaction format and its hash.
//! - [`bundle`]: laying out and hashing a bundle of transfers.
//! - [`client`]: the node API and the [`LedgerClient`] seam.

pub mod address;
pub mod bundle;
pub mod client;
pub mod error;
pub mod transaction;
pub mod trytes;

pub use bundle::Transfer;
pub use client::{LedgerClient, NodeClient, NodeInfo};
pub use error::LedgerError;
pub use transaction::Transaction;
