//! Per-build audit trail of submission attempts.
//!
//! One JSON-array file per build, living in the build's artifact directory.
//! Append-only from this subsystem's point of view: the existing array is
//! read, one event is appended, and the file is rewritten. Best-effort
//! observability; the queue remains the correctness source of truth.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use resultwire_core::{BuildHandle, ServerConfig};

/// File name of the per-build audit log, relative to the build root dir.
pub const AUDIT_FILE: &str = "result_audit.json";

/// One submission attempt outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    /// Submission id assigned by the server; null when nothing was accepted.
    pub id: Option<i64>,
    pub pushed: bool,
    pub date: DateTime<Utc>,
    pub location: String,
    pub shared_space: String,
    /// Present (and `true`) only for transient-unavailability outcomes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporarily_unavailable: Option<bool>,
}

/// Append one event to the build's audit log, creating it if needed.
pub fn record(
    build: &BuildHandle,
    config: &ServerConfig,
    id: Option<i64>,
    temporarily_unavailable: bool,
) -> anyhow::Result<()> {
    let path = audit_path(build);
    let mut events = read_events(&path)?;
    events.push(AuditEvent {
        id,
        pushed: id.is_some(),
        date: Utc::now(),
        location: config.location.clone(),
        shared_space: config.shared_space.clone(),
        temporarily_unavailable: temporarily_unavailable.then_some(true),
    });

    fs::create_dir_all(&build.root_dir)
        .with_context(|| format!("failed to create build dir {:?}", build.root_dir))?;
    let body = serde_json::to_string(&events).context("failed to serialize audit log")?;
    fs::write(&path, body).with_context(|| format!("failed to write audit log {path:?}"))?;
    Ok(())
}

/// Read the build's audit log; empty when none exists yet.
pub fn read(build: &BuildHandle) -> anyhow::Result<Vec<AuditEvent>> {
    read_events(&audit_path(build))
}

pub fn audit_path(build: &BuildHandle) -> PathBuf {
    build.root_dir.join(AUDIT_FILE)
}

fn read_events(path: &Path) -> anyhow::Result<Vec<AuditEvent>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let body =
        fs::read_to_string(path).with_context(|| format!("failed to read audit log {path:?}"))?;
    serde_json::from_str(&body).with_context(|| format!("malformed audit log {path:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use resultwire_core::{BuildOrigin, BuildRef};

    fn build_in(dir: &Path) -> BuildHandle {
        BuildHandle::new(BuildRef::new("alpha", 5), dir.join("5"), BuildOrigin::Plain)
    }

    fn config() -> ServerConfig {
        ServerConfig {
            location: "https://qc.example.com".to_string(),
            shared_space: "1001".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn record_creates_log_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let build = build_in(dir.path());

        assert!(read(&build).unwrap().is_empty());

        record(&build, &config(), Some(42), false).unwrap();
        record(&build, &config(), None, true).unwrap();

        let events = read(&build).unwrap();
        assert_eq!(events.len(), 2);

        assert_eq!(events[0].id, Some(42));
        assert!(events[0].pushed);
        assert_eq!(events[0].temporarily_unavailable, None);

        assert_eq!(events[1].id, None);
        assert!(!events[1].pushed);
        assert_eq!(events[1].temporarily_unavailable, Some(true));
    }

    #[test]
    fn wire_shape_is_camel_case_with_null_id() {
        let dir = tempfile::tempdir().unwrap();
        let build = build_in(dir.path());
        record(&build, &config(), None, false).unwrap();

        let body = fs::read_to_string(audit_path(&build)).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        let event = &parsed.as_array().unwrap()[0];

        assert!(event.get("id").unwrap().is_null());
        assert_eq!(event.get("pushed").unwrap(), false);
        assert_eq!(event.get("sharedSpace").unwrap(), "1001");
        assert_eq!(event.get("location").unwrap(), "https://qc.example.com");
        assert!(event.get("date").unwrap().is_string());
        // Omitted entirely unless the outcome was transient unavailability.
        assert!(event.get("temporarilyUnavailable").is_none());
    }

    #[test]
    fn temporarily_unavailable_is_true_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let build = build_in(dir.path());
        record(&build, &config(), None, true).unwrap();

        let body = fs::read_to_string(audit_path(&build)).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        let event = &parsed.as_array().unwrap()[0];
        assert_eq!(event.get("temporarilyUnavailable").unwrap(), true);
    }
}
