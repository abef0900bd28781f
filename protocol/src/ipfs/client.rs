//! IPFS HTTP API client.
//!
//! Only one command is needed: `add`, which takes a multipart upload and
//! answers with a JSON object per added entry:
//!
//! ```text
//! {"Name":"file","Hash":"QmT78zSuBmuS4z925WZfrqQ1qHaJ56DQaTfyMUF7F8ff5o","Size":"13"}
//! ```

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use thiserror::Error;

use super::endpoint::IpfsOptions;

/// Errors raised by a storage upload.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("IPFS API returned status {status}: {body}")]
    Service { status: u16, body: String },

    #[error("malformed IPFS response: {0}")]
    MalformedResponse(String),
}

/// What the storage service reports for an added file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedContent {
    /// Content identifier.
    pub hash: String,
    pub name: String,
    /// Size as reported by the service (includes DAG overhead).
    pub size: Option<u64>,
}

/// Content-addressed storage capability used by the store pipeline.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Upload `data` to the service described by `options`.
    async fn add(&self, options: &IpfsOptions, data: Bytes) -> Result<AddedContent, StorageError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AddResponse {
    #[serde(default)]
    name: String,
    hash: String,
    #[serde(default)]
    size: Option<String>,
}

/// [`StorageClient`] backed by the IPFS HTTP API.
#[derive(Debug, Clone)]
pub struct IpfsHttpClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl IpfsHttpClient {
    pub fn new(timeout: Duration) -> Result<Self, StorageError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::Client(e.to_string()))?;
        Ok(Self { http, timeout })
    }

    fn map_send_error(&self, e: reqwest::Error) -> StorageError {
        if e.is_timeout() {
            StorageError::Timeout(self.timeout.as_secs())
        } else {
            StorageError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl StorageClient for IpfsHttpClient {
    async fn add(&self, options: &IpfsOptions, data: Bytes) -> Result<AddedContent, StorageError> {
        let url = options.endpoint.add_url();
        let length = data.len();
        tracing::debug!(url = %url, bytes = length, "adding content to IPFS");

        let part = reqwest::multipart::Part::stream_with_length(data, length as u64)
            .file_name("file")
            .mime_str("application/octet-stream")
            .map_err(|e| StorageError::Client(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let mut request = self.http.post(&url).multipart(form);
        if let Some(auth) = &options.auth_header {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            return Err(StorageError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let added = parse_add_response(&body)?;
        tracing::info!(hash = %added.hash, bytes = length, "content added to IPFS");
        Ok(added)
    }
}

/// Parse an `add` response body. With progress or wrapping enabled the API
/// streams one JSON object per line; the last one describes the root.
fn parse_add_response(body: &str) -> Result<AddedContent, StorageError> {
    let line = body
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .ok_or_else(|| StorageError::MalformedResponse("empty body".into()))?;

    let parsed: AddResponse = serde_json::from_str(line)
        .map_err(|e| StorageError::MalformedResponse(format!("{}: {}", e, line)))?;

    if parsed.hash.is_empty() {
        return Err(StorageError::MalformedResponse("missing Hash".into()));
    }

    Ok(AddedContent {
        hash: parsed.hash,
        name: parsed.name,
        size: parsed.size.and_then(|s| s.parse().ok()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipfs::IpfsEndpoint;

    fn options_for(server: &mockito::ServerGuard, auth: Option<&str>) -> IpfsOptions {
        let endpoint: IpfsEndpoint = format!("{}/api/v0/", server.url()).parse().unwrap();
        IpfsOptions {
            endpoint,
            auth_header: auth.map(str::to_string),
        }
    }

    #[test]
    fn parses_single_line_response() {
        let added = parse_add_response(r#"{"Name":"file","Hash":"QmAbc","Size":"13"}"#).unwrap();
        assert_eq!(added.hash, "QmAbc");
        assert_eq!(added.name, "file");
        assert_eq!(added.size, Some(13));
    }

    #[test]
    fn takes_last_line_of_streamed_response() {
        let body = "{\"Name\":\"a\",\"Hash\":\"QmFirst\"}\n{\"Name\":\"\",\"Hash\":\"QmRoot\"}\n";
        assert_eq!(parse_add_response(body).unwrap().hash, "QmRoot");
    }

    #[test]
    fn rejects_malformed_bodies() {
        assert!(matches!(
            parse_add_response(""),
            Err(StorageError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_add_response("not json"),
            Err(StorageError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_add_response(r#"{"Name":"x","Hash":""}"#),
            Err(StorageError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn add_posts_multipart_with_auth() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v0/add")
            .match_header("authorization", "Basic secret")
            .match_header(
                "content-type",
                mockito::Matcher::Regex("^multipart/form-data".into()),
            )
            .match_body(mockito::Matcher::Regex("hello".into()))
            .with_status(200)
            .with_body(r#"{"Name":"file","Hash":"QmHello","Size":"13"}"#)
            .create_async()
            .await;

        let client = IpfsHttpClient::new(Duration::from_secs(5)).unwrap();
        let added = client
            .add(&options_for(&server, Some("Basic secret")), Bytes::from_static(b"hello"))
            .await
            .unwrap();

        assert_eq!(added.hash, "QmHello");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn add_surfaces_service_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/v0/add")
            .with_status(401)
            .with_body("unauthorized")
            .create_async()
            .await;

        let client = IpfsHttpClient::new(Duration::from_secs(5)).unwrap();
        let err = client
            .add(&options_for(&server, None), Bytes::from_static(b"hello"))
            .await
            .unwrap_err();

        match err {
            StorageError::Service { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "unauthorized");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn add_reports_unreachable_service() {
        let endpoint: IpfsEndpoint = "http://127.0.0.1:1/api/v0/".parse().unwrap();
        let options = IpfsOptions {
            endpoint,
            auth_header: None,
        };
        let client = IpfsHttpClient::new(Duration::from_secs(5)).unwrap();
        let err = client.add(&options, Bytes::from_static(b"x")).await.unwrap_err();
        assert!(matches!(err, StorageError::Network(_) | StorageError::Timeout(_)));
    }
}
