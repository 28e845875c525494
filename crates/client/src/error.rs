//! Remote client error taxonomy.

use thiserror::Error;

/// Errors surfaced by the remote quality-management client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured shared space does not exist on the server.
    #[error("shared space not found: {0}")]
    SpaceNotFound(String),

    /// Authentication was rejected.
    #[error("login failed: {0}")]
    LoginFailed(String),

    /// The result file to submit does not exist.
    #[error("result file not found: {0}")]
    FileNotFound(String),

    /// The server signalled it is overloaded; retry later without penalty.
    #[error("service temporarily unavailable")]
    TemporarilyUnavailable,

    /// Any other request/transport failure.
    #[error("request failed: {0}")]
    RequestFailed(String),
}
