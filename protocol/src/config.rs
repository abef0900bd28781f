//! # Configuration & Constants
//!
//! Every fixed number the store pipeline depends on lives here, next to the
//! runtime configuration that is loaded once at process start and then
//! shared read-only between requests.
//!
//! The runtime configuration is a TOML file:
//!
//! ```toml
//! seed = "SEED99..."
//!
//! [node]
//! provider = "https://nodes.devnet.iota.org:443"
//! depth = 3
//! mwm = 9
//!
//! [ipfs]
//! provider = "https://ipfs.infura.io:5001/api/v0/"
//! token = "base64-user-colon-secret"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::ternary::is_trytes;
use crate::ipfs::IpfsEndpoint;

// ---------------------------------------------------------------------------
// Upload Policy
// ---------------------------------------------------------------------------

/// Uploads must be strictly smaller than this many bytes.
pub const MAX_UPLOAD_BYTES: usize = 10_240;

// ---------------------------------------------------------------------------
// Tangle Layout
// ---------------------------------------------------------------------------

/// Seeds, addresses and hashes are all 81 trytes (243 trits).
pub const HASH_LENGTH_TRYTES: usize = 81;

/// Maximum seed length. Shorter seeds are right-padded with `9`.
pub const SEED_LENGTH_TRYTES: usize = HASH_LENGTH_TRYTES;

/// Full serialized transaction length.
pub const TRANSACTION_LENGTH_TRYTES: usize = 2673;

/// Message (signature-or-message) fragment carried by one transaction.
pub const MESSAGE_FRAGMENT_TRYTES: usize = 2187;

/// Tag and obsolete-tag field length.
pub const TAG_LENGTH_TRYTES: usize = 27;

/// Key index used to derive the receive address from the seed.
pub const ADDRESS_INDEX: u64 = 0;

/// Security level used for address derivation (number of key fragments).
pub const SECURITY_LEVEL: u8 = 2;

/// Zero-value transfers need no inputs, so the "sender" is a placeholder
/// seed of all nines.
pub const PLACEHOLDER_SEED: &str = concat!(
    "999999999",
    "999999999",
    "999999999",
    "999999999",
    "999999999",
    "999999999",
    "999999999",
    "999999999",
    "999999999",
);

/// Value of the `X-IOTA-API-Version` header sent with every node command.
pub const IOTA_API_VERSION: &str = "1";

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Tip selection depth when the config file does not specify one.
pub const DEFAULT_DEPTH: u32 = 3;

/// Minimum weight magnitude when the config file does not specify one.
/// 14 is what mainnet nodes require; devnet accepts 9.
pub const DEFAULT_MWM: u8 = 14;

/// Highest MWM accepted in configuration.
pub const MAX_MWM: u8 = 27;

/// Default HTTP API port.
pub const DEFAULT_API_PORT: u16 = 4000;

/// Default Prometheus metrics port.
pub const DEFAULT_METRICS_PORT: u16 = 4001;

/// Request timeout for ledger node calls. Remote proof-of-work happens inside
/// `attachToTangle`, so this is generous.
pub const NODE_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Request timeout for IPFS uploads.
pub const IPFS_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Runtime Configuration
// ---------------------------------------------------------------------------

/// Errors raised while loading or validating a [`StoreConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Ledger node settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node API endpoint, e.g. `https://nodes.devnet.iota.org:443`.
    pub provider: String,
    /// Tip selection depth for `getTransactionsToApprove`.
    #[serde(default = "default_depth")]
    pub depth: u32,
    /// Minimum weight magnitude for `attachToTangle`.
    #[serde(default = "default_mwm")]
    pub mwm: u8,
}

/// IPFS API settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpfsConfig {
    /// API endpoint of the form `scheme://host:port/api-path`.
    pub provider: String,
    /// Credential sent as `Authorization: Basic <token>` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl IpfsConfig {
    /// The configured token, treating an empty string as absent.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}

impl fmt::Debug for IpfsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IpfsConfig")
            .field("provider", &self.provider)
            .field("token", &self.token().map(|_| "<redacted>"))
            .finish()
    }
}

/// Process-wide configuration for the store pipeline.
///
/// Loaded once, wrapped in an `Arc`, and never mutated afterwards.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Seed from which the receive address is derived.
    pub seed: String,
    pub node: NodeConfig,
    pub ipfs: IpfsConfig,
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("seed", &"<redacted>")
            .field("node", &self.node)
            .field("ipfs", &self.ipfs)
            .finish()
    }
}

impl StoreConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: StoreConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate the TOML file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Replace the seed (e.g. from an environment variable) and re-validate.
    pub fn with_seed(mut self, seed: impl Into<String>) -> Result<Self, ConfigError> {
        self.seed = seed.into();
        self.validate()?;
        Ok(self)
    }

    /// Check every field that can be checked without touching the network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.seed.is_empty() || self.seed.len() > SEED_LENGTH_TRYTES || !is_trytes(&self.seed) {
            return Err(ConfigError::Invalid(format!(
                "seed must be 1 to {} trytes (A-Z, 9)",
                SEED_LENGTH_TRYTES
            )));
        }

        let provider = self.node.provider.as_str();
        if !(provider.starts_with("http://") || provider.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "node.provider must be an http(s) URL, got '{}'",
                provider
            )));
        }
        if self.node.depth == 0 {
            return Err(ConfigError::Invalid("node.depth must be at least 1".into()));
        }
        if self.node.mwm == 0 || self.node.mwm > MAX_MWM {
            return Err(ConfigError::Invalid(format!(
                "node.mwm must be between 1 and {}",
                MAX_MWM
            )));
        }

        self.ipfs
            .provider
            .parse::<IpfsEndpoint>()
            .map_err(|e| ConfigError::Invalid(format!("ipfs.provider: {}", e)))?;

        Ok(())
    }

    /// A sample configuration, written by `tangle-store-node init`.
    pub fn sample() -> Self {
        Self {
            seed: PLACEHOLDER_SEED.to_string(),
            node: NodeConfig {
                provider: "https://nodes.devnet.iota.org:443".into(),
                depth: DEFAULT_DEPTH,
                mwm: 9,
            },
            ipfs: IpfsConfig {
                provider: "https://ipfs.infura.io:5001/api/v0/".into(),
                token: None,
            },
        }
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

fn default_depth() -> u32 {
    DEFAULT_DEPTH
}

fn default_mwm() -> u8 {
    DEFAULT_MWM
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        seed = "SEEDTEST9"

        [node]
        provider = "https://nodes.devnet.iota.org:443"
        depth = 4
        mwm = 9

        [ipfs]
        provider = "https://ipfs.infura.io:5001/api/v0/"
        token = "dXNlcjpzZWNyZXQ="
    "#;

    #[test]
    fn parses_full_document() {
        let config = StoreConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.seed, "SEEDTEST9");
        assert_eq!(config.node.depth, 4);
        assert_eq!(config.node.mwm, 9);
        assert_eq!(config.ipfs.token(), Some("dXNlcjpzZWNyZXQ="));
    }

    #[test]
    fn depth_and_mwm_default_when_omitted() {
        let config = StoreConfig::from_toml_str(
            r#"
            seed = "ABC"
            [node]
            provider = "http://localhost:14265"
            [ipfs]
            provider = "http://localhost:5001/api/v0/"
            "#,
        )
        .unwrap();
        assert_eq!(config.node.depth, DEFAULT_DEPTH);
        assert_eq!(config.node.mwm, DEFAULT_MWM);
        assert_eq!(config.ipfs.token(), None);
    }

    #[test]
    fn empty_token_counts_as_absent() {
        let ipfs = IpfsConfig {
            provider: "https://ipfs.infura.io:5001/api/v0/".into(),
            token: Some(String::new()),
        };
        assert_eq!(ipfs.token(), None);
    }

    #[test]
    fn rejects_bad_seed() {
        let bad = SAMPLE.replace("SEEDTEST9", "lowercase");
        assert!(matches!(
            StoreConfig::from_toml_str(&bad),
            Err(ConfigError::Invalid(_))
        ));

        let too_long = SAMPLE.replace("SEEDTEST9", &"A".repeat(82));
        assert!(StoreConfig::from_toml_str(&too_long).is_err());
    }

    #[test]
    fn rejects_out_of_range_mwm() {
        let bad = SAMPLE.replace("mwm = 9", "mwm = 40");
        assert!(StoreConfig::from_toml_str(&bad).is_err());
    }

    #[test]
    fn rejects_unparseable_ipfs_provider() {
        let bad = SAMPLE.replace("https://ipfs.infura.io:5001/api/v0/", "ipfs.infura.io");
        let err = StoreConfig::from_toml_str(&bad).unwrap_err();
        assert!(err.to_string().contains("ipfs.provider"));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            StoreConfig::from_toml_str("seed = "),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = StoreConfig::from_toml_str(SAMPLE).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("SEEDTEST9"));
        assert!(!rendered.contains("dXNlcjpzZWNyZXQ="));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn with_seed_overrides_and_validates() {
        let config = StoreConfig::from_toml_str(SAMPLE).unwrap();
        let replaced = config.clone().with_seed("OTHERSEED").unwrap();
        assert_eq!(replaced.seed, "OTHERSEED");
        assert!(config.with_seed("not trytes").is_err());
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let config = StoreConfig::load(&path).unwrap();
        assert_eq!(config.node.provider, "https://nodes.devnet.iota.org:443");

        let missing = StoreConfig::load(dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn sample_round_trips_through_toml() {
        let sample = StoreConfig::sample();
        let rendered = sample.to_toml_string().unwrap();
        assert_eq!(StoreConfig::from_toml_str(&rendered).unwrap(), sample);
    }

    #[test]
    fn placeholder_seed_is_81_nines() {
        assert_eq!(PLACEHOLDER_SEED.len(), SEED_LENGTH_TRYTES);
        assert!(PLACEHOLDER_SEED.bytes().all(|b| b == b'9'));
    }

    #[test]
    fn layout_constants_add_up() {
        // 2187 message + 486 trytes of header fields.
        assert_eq!(TRANSACTION_LENGTH_TRYTES, MESSAGE_FRAGMENT_TRYTES + 486);
        assert!(MAX_UPLOAD_BYTES > 0);
    }
}
