// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Tangle Store — Core Library
//!
//! Takes a small file, puts the bytes on IPFS, and writes a pointer to them
//! (plus the file's metadata) onto the IOTA Tangle as a zero-value
//! transaction. The content lives in content-addressed storage; the ledger
//! holds the timestamped, immutable record that it existed.
//!
//! ## Architecture
//!
//! - **store** — The request pipeline: validate, check, upload, compose,
//!   submit. Start here.
//! - **tangle** — Ledger side: address derivation, bundles, transactions,
//!   and the node API client.
//! - **ipfs** — Storage side: endpoint parsing and the upload client.
//! - **crypto** — SHA-256 for checksums, Kerl and Curl for ternary hashing.
//! - **config** — Constants and the TOML runtime configuration.
//!
//! ## Design Notes
//!
//! 1. The handler is generic over [`tangle::LedgerClient`] and
//!    [`ipfs::StorageClient`]. Production wires in HTTP clients, tests wire
//!    in fakes.
//! 2. Configuration is loaded once and shared read-only; a request never
//!    mutates anything another request can see.
//! 3. Failures are typed ([`store::StoreError`]) right up to the response
//!    boundary, where they become a message string.

pub mod config;
pub mod crypto;
pub mod ipfs;
pub mod store;
pub mod tangle;

pub use config::StoreConfig;
pub use store::{StoreRequest, StoreRequestHandler, StoreResponse};
