//! `resultwire-client` — narrow contract against the remote
//! quality-management service.
//!
//! The dispatcher depends only on [`QualityClient`] and [`ClientFactory`];
//! [`rest::RestClient`] is the production implementation.

pub mod error;
pub mod rest;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use resultwire_core::{ServerConfig, ServerIdentity};

pub use error::ClientError;
pub use rest::RestClient;

/// Client contract the dispatch pipeline depends on.
#[async_trait]
pub trait QualityClient: Send + Sync {
    /// Cheap probe that proves the endpoint, shared space and credentials
    /// are usable. Submits nothing.
    async fn validate_configuration(&self) -> Result<(), ClientError>;

    /// Whether the remote service still wants test results for `job_name`
    /// on the server identified by `identity`.
    async fn is_result_relevant(
        &self,
        identity: ServerIdentity,
        job_name: &str,
    ) -> Result<bool, ClientError>;

    /// Submit one result artifact; returns the server-assigned submission id.
    async fn submit_result(&self, file: &Path, compressed: bool) -> Result<i64, ClientError>;
}

/// Creates clients from the current configuration.
///
/// The dispatcher obtains at most one client per pass and drops it when a
/// submission fails, forcing re-validation before the next attempt.
pub trait ClientFactory: Send + Sync {
    fn create(&self, config: &ServerConfig) -> Arc<dyn QualityClient>;
}

/// Factory producing [`RestClient`] instances.
#[derive(Debug, Default)]
pub struct RestClientFactory;

impl ClientFactory for RestClientFactory {
    fn create(&self, config: &ServerConfig) -> Arc<dyn QualityClient> {
        Arc::new(RestClient::new(config.clone()))
    }
}
