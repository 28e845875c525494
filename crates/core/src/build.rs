//! Build identity types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Reference to one build of a CI project.
///
/// `project` is the stable logical job identifier; `number` increases
/// monotonically per project. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildRef {
    pub project: String,
    pub number: u32,
}

impl BuildRef {
    pub fn new(project: impl Into<String>, number: u32) -> Self {
        Self {
            project: project.into(),
            number,
        }
    }
}

impl core::fmt::Display for BuildRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}#{}", self.project, self.number)
    }
}

/// How a build relates to its job definition.
///
/// Resolved once at build-lookup time, so downstream code branches on a
/// tagged variant instead of re-probing the build system's model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildOrigin {
    /// Ordinary build of a plain job.
    Plain,
    /// Child execution of a matrix-style job.
    MatrixChild { parent_job: String },
}

/// A resolved build: identity plus where its artifacts live on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildHandle {
    pub build: BuildRef,
    /// Directory holding the build's artifacts (result file, audit log).
    pub root_dir: PathBuf,
    pub origin: BuildOrigin,
}

impl BuildHandle {
    pub fn new(build: BuildRef, root_dir: impl Into<PathBuf>, origin: BuildOrigin) -> Self {
        Self {
            build,
            root_dir: root_dir.into(),
            origin,
        }
    }

    /// Job name used for remote relevance lookups.
    ///
    /// Matrix child builds report under their parent job's name.
    pub fn job_name(&self) -> &str {
        match &self.origin {
            BuildOrigin::Plain => &self.build.project,
            BuildOrigin::MatrixChild { parent_job } => parent_job,
        }
    }
}
