//! Configuration and publishing-gate ports.

use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use resultwire_core::{ServerConfig, ServerIdentity};

/// Env var overriding the dispatch interval, in milliseconds.
pub const DISPATCH_PERIOD_ENV: &str = "RESULTWIRE_DISPATCH_PERIOD_MS";

/// Default dispatch interval.
pub const DEFAULT_DISPATCH_PERIOD: Duration = Duration::from_millis(10_000);

/// Source of the current remote-endpoint configuration.
///
/// Read once per pass; a pass sees one consistent snapshot even if an
/// administrator edits the settings concurrently.
pub trait ConfigStore: Send + Sync {
    fn server_config(&self) -> ServerConfig;

    /// Stable identity of this CI server, keyed into relevance checks.
    fn identity(&self) -> ServerIdentity;
}

/// Gate that can administratively suspend event publishing.
pub trait EventPublisher: Send + Sync {
    fn is_suspended(&self) -> bool;
}

/// Dispatch interval: default 10s, overridable via env for operability.
pub fn dispatch_period() -> Duration {
    match std::env::var(DISPATCH_PERIOD_ENV) {
        Ok(value) => match value.parse::<u64>() {
            Ok(ms) if ms > 0 => Duration::from_millis(ms),
            _ => {
                tracing::warn!(
                    value = %value,
                    "invalid dispatch period override, using default"
                );
                DEFAULT_DISPATCH_PERIOD
            }
        },
        Err(_) => DEFAULT_DISPATCH_PERIOD,
    }
}

/// In-memory configuration for tests/dev; implements both ports.
#[derive(Debug)]
pub struct StaticConfig {
    config: RwLock<ServerConfig>,
    identity: ServerIdentity,
    suspended: AtomicBool,
}

impl StaticConfig {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: RwLock::new(config),
            identity: ServerIdentity::new(),
            suspended: AtomicBool::new(false),
        }
    }

    pub fn set_config(&self, config: ServerConfig) {
        *self.config.write().unwrap() = config;
    }

    pub fn suspend(&self, suspended: bool) {
        self.suspended.store(suspended, Ordering::SeqCst);
    }
}

impl ConfigStore for StaticConfig {
    fn server_config(&self) -> ServerConfig {
        self.config.read().unwrap().clone()
    }

    fn identity(&self) -> ServerIdentity {
        self.identity
    }
}

impl EventPublisher for StaticConfig {
    fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test because the override is read from process-wide env state.
    #[test]
    fn dispatch_period_env_override() {
        assert_eq!(dispatch_period(), DEFAULT_DISPATCH_PERIOD);

        unsafe { std::env::set_var(DISPATCH_PERIOD_ENV, "2500") };
        assert_eq!(dispatch_period(), Duration::from_millis(2500));

        unsafe { std::env::set_var(DISPATCH_PERIOD_ENV, "not-a-number") };
        assert_eq!(dispatch_period(), DEFAULT_DISPATCH_PERIOD);

        unsafe { std::env::remove_var(DISPATCH_PERIOD_ENV) };
    }
}
