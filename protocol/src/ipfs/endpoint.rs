//! IPFS API endpoint parsing.
//!
//! The provider is configured as a single URL, `scheme://host:port/api-path`,
//! and split into the parts the HTTP client is configured from. A port is
//! mandatory; the API path defaults to `/api/v0/`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::config::IpfsConfig;

/// API path used when the provider URL has none.
pub const DEFAULT_API_PATH: &str = "/api/v0/";

/// Errors raised while parsing a provider URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    #[error("'{0}' does not start with http:// or https://")]
    UnsupportedScheme(String),

    #[error("'{0}' has no host")]
    MissingHost(String),

    #[error("'{0}' has no port, expected scheme://host:port/path")]
    MissingPort(String),

    #[error("bad port in '{url}': {reason}")]
    InvalidPort { url: String, reason: String },
}

/// A parsed IPFS provider URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpfsEndpoint {
    /// `http` or `https`.
    pub protocol: String,
    pub host: String,
    pub port: u16,
    /// Always starts and ends with `/`.
    pub api_path: String,
}

impl IpfsEndpoint {
    /// Base URL for API calls, e.g. `https://ipfs.infura.io:5001/api/v0/`.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}{}", self.protocol, self.host, self.port, self.api_path)
    }

    /// URL of the `add` command.
    pub fn add_url(&self) -> String {
        format!("{}add", self.base_url())
    }
}

impl fmt::Display for IpfsEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base_url())
    }
}

impl FromStr for IpfsEndpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (protocol, rest) = if let Some(rest) = s.strip_prefix("https://") {
            ("https", rest)
        } else if let Some(rest) = s.strip_prefix("http://") {
            ("http", rest)
        } else {
            return Err(EndpointError::UnsupportedScheme(s.to_string()));
        };

        let (authority, path) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, ""),
        };

        let (host, port) = authority
            .rsplit_once(':')
            .ok_or_else(|| EndpointError::MissingPort(s.to_string()))?;

        if host.is_empty() {
            return Err(EndpointError::MissingHost(s.to_string()));
        }
        if port.is_empty() {
            return Err(EndpointError::MissingPort(s.to_string()));
        }
        let port = port.parse::<u16>().map_err(|e| EndpointError::InvalidPort {
            url: s.to_string(),
            reason: e.to_string(),
        })?;

        Ok(IpfsEndpoint {
            protocol: protocol.to_string(),
            host: host.to_string(),
            port,
            api_path: normalize_api_path(path),
        })
    }
}

fn normalize_api_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        DEFAULT_API_PATH.to_string()
    } else {
        format!("/{}/", trimmed)
    }
}

/// Everything the storage client is configured from: the endpoint plus an
/// optional `Authorization` header value.
#[derive(Clone, PartialEq, Eq)]
pub struct IpfsOptions {
    pub endpoint: IpfsEndpoint,
    pub auth_header: Option<String>,
}

impl IpfsOptions {
    /// Build options from configuration. A configured token becomes
    /// `Basic <token>`.
    pub fn from_config(config: &IpfsConfig) -> Result<Self, EndpointError> {
        let endpoint = config.provider.parse()?;
        Ok(Self {
            endpoint,
            auth_header: config.token().map(|t| format!("Basic {}", t)),
        })
    }
}

impl fmt::Debug for IpfsOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IpfsOptions")
            .field("endpoint", &self.endpoint)
            .field("auth_header", &self.auth_header.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
