//! # Cryptographic Primitives
//!
//! Two worlds meet here:
//!
//! - **SHA-256** over raw bytes, for verifying the checksum a client sends
//!   with its upload.
//! - **Ternary hashing** for the Tangle: [`kerl`] (Keccak-384 over trits)
//!   for addresses and bundle hashes, and [`curl`] (Curl-P-81) for
//!   transaction hashes, both built on the balanced ternary codec in
//!   [`ternary`].
//!
//! Nothing here does signing. Zero-value bundles carry no inputs, so no
//! private key material ever leaves the seed-to-address derivation.

pub mod curl;
pub mod hash;
pub mod kerl;
pub mod ternary;

pub use curl::Curl;
pub use hash::{sha256, sha256_hex, verify_sha256_hex};
pub use kerl::Kerl;
pub use ternary::{TernaryError, Trit};
