//! reqwest-backed implementation of the client contract.

use std::path::Path;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use serde::Deserialize;
use tracing::debug;

use resultwire_core::{ServerConfig, ServerIdentity};

use crate::error::ClientError;
use crate::QualityClient;

/// HTTP client against the remote service's REST surface.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    config: ServerConfig,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: i64,
}

impl RestClient {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Build a shared-space-scoped URL for `path` (must start with `/`
    /// or be empty).
    fn url(&self, path: &str) -> String {
        format!(
            "{}/api/shared_spaces/{}{}",
            self.config.location.trim_end_matches('/'),
            self.config.shared_space,
            path
        )
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(self.url(path))
            .basic_auth(&self.config.username, Some(&self.config.password))
    }
}

#[async_trait]
impl QualityClient for RestClient {
    async fn validate_configuration(&self) -> Result<(), ClientError> {
        debug!(location = %self.config.location, "probing server configuration");
        let resp = self
            .get("")
            .send()
            .await
            .map_err(|e| ClientError::RequestFailed(e.to_string()))?;

        match resp.status() {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ClientError::LoginFailed(
                format!("server rejected credentials ({})", resp.status()),
            )),
            StatusCode::NOT_FOUND => {
                Err(ClientError::SpaceNotFound(self.config.shared_space.clone()))
            }
            s => Err(ClientError::RequestFailed(format!(
                "unexpected status {s} from configuration probe"
            ))),
        }
    }

    async fn is_result_relevant(
        &self,
        identity: ServerIdentity,
        job_name: &str,
    ) -> Result<bool, ClientError> {
        let resp = self
            .get(&format!(
                "/ci-servers/{identity}/jobs/{job_name}/test-results/needed"
            ))
            .send()
            .await
            .map_err(|e| ClientError::RequestFailed(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ClientError::RequestFailed(format!(
                "relevance check returned status {}",
                resp.status()
            )));
        }

        resp.json::<bool>()
            .await
            .map_err(|e| ClientError::RequestFailed(format!("malformed relevance response: {e}")))
    }

    async fn submit_result(&self, file: &Path, compressed: bool) -> Result<i64, ClientError> {
        let body = tokio::fs::read(file).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ClientError::FileNotFound(file.display().to_string())
            } else {
                ClientError::RequestFailed(format!("failed to read {}: {e}", file.display()))
            }
        })?;

        debug!(file = %file.display(), bytes = body.len(), "uploading test results");
        let mut req = self
            .http
            .post(self.url("/test-results"))
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header(CONTENT_TYPE, "application/xml")
            .body(body);
        if compressed {
            req = req.header(CONTENT_ENCODING, "gzip");
        }

        let resp = req
            .send()
            .await
            .map_err(|e| ClientError::RequestFailed(e.to_string()))?;

        match resp.status() {
            s if s.is_success() => {
                let parsed: SubmitResponse = resp.json().await.map_err(|e| {
                    ClientError::RequestFailed(format!("malformed submission response: {e}"))
                })?;
                Ok(parsed.id)
            }
            StatusCode::SERVICE_UNAVAILABLE | StatusCode::TOO_MANY_REQUESTS => {
                Err(ClientError::TemporarilyUnavailable)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ClientError::LoginFailed(
                format!("server rejected credentials ({})", resp.status()),
            )),
            s => Err(ClientError::RequestFailed(format!(
                "submission returned status {s}"
            ))),
        }
    }
}
