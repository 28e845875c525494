//! Remote endpoint configuration and local server identity.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Connection settings for the remote quality-management service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the remote service; empty means "not configured yet".
    pub location: String,
    /// Shared-space identifier within the remote service.
    pub shared_space: String,
    pub username: String,
    pub password: String,
}

impl ServerConfig {
    /// Whether the configuration is complete enough to attempt a connection.
    pub fn is_complete(&self) -> bool {
        !self.location.is_empty()
    }
}

/// Stable identity of this CI server.
///
/// Used as the key in remote relevance checks, so the remote side can tell
/// which of its connected servers a job name belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerIdentity(Uuid);

impl ServerIdentity {
    /// Create a fresh identity.
    ///
    /// Uses UUIDv7 (time-ordered). Prefer passing identities explicitly in
    /// tests for determinism.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ServerIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for ServerIdentity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for ServerIdentity {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_location_is_incomplete() {
        let config = ServerConfig::default();
        assert!(!config.is_complete());

        let config = ServerConfig {
            location: "https://qc.example.com".to_string(),
            ..Default::default()
        };
        assert!(config.is_complete());
    }

    #[test]
    fn identity_round_trips_through_display() {
        let identity = ServerIdentity::new();
        let parsed: ServerIdentity = identity.to_string().parse().unwrap();
        assert_eq!(identity, parsed);
    }
}
