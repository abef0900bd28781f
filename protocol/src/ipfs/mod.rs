//! # Content-Addressed Storage
//!
//! Uploads go to an IPFS node through its HTTP API. [`endpoint`] turns the
//! configured provider URL into client options, [`client`] performs the
//! upload behind the [`StorageClient`] trait so the store pipeline can be
//! driven by a mock in tests.

pub mod client;
pub mod endpoint;

pub use client::{AddedContent, IpfsHttpClient, StorageClient, StorageError};
pub use endpoint::{EndpointError, IpfsEndpoint, IpfsOptions};
