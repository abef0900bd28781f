//! # Store Operation
//!
//! Accept a base64 file, check it, upload it to IPFS, and record its
//! metadata and content identifier on the Tangle. [`StoreRequestHandler`]
//! is the entry point; it is generic over the ledger and storage clients
//! so tests can drive it without a network.

pub mod error;
pub mod handler;
pub mod message;
pub mod request;
pub mod trace;

pub use error::{SizeError, StoreError};
pub use handler::{StoreOutcome, StoreRequestHandler};
pub use message::TangleMessage;
pub use request::{StoreReceipt, StoreRequest, StoreResponse, ValidatedRequest};
pub use trace::{StepEntry, StepLog};
