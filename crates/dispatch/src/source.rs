//! Build-system lookup port.

use std::collections::HashMap;
use std::sync::RwLock;

use resultwire_core::{BuildHandle, BuildRef};

/// Resolves queue items against the host build system's model.
///
/// A queue item can outlive what it points at (project renamed, build
/// rotated away); both lookups answer "does this still exist" rather than
/// failing, so the dispatcher can treat staleness as a typed outcome.
pub trait BuildSource: Send + Sync {
    /// Whether a project with this name still exists.
    fn has_project(&self, project: &str) -> bool;

    /// Resolve a specific build; `None` when it no longer exists.
    ///
    /// The returned handle carries the build's artifact directory and its
    /// origin (plain vs. matrix child), resolved here once.
    fn find_build(&self, build: &BuildRef) -> Option<BuildHandle>;
}

/// In-memory build source for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryBuildSource {
    builds: RwLock<HashMap<(String, u32), BuildHandle>>,
}

impl InMemoryBuildSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, handle: BuildHandle) {
        let key = (handle.build.project.clone(), handle.build.number);
        self.builds.write().unwrap().insert(key, handle);
    }

    pub fn remove(&self, build: &BuildRef) {
        self.builds
            .write()
            .unwrap()
            .remove(&(build.project.clone(), build.number));
    }
}

impl BuildSource for InMemoryBuildSource {
    fn has_project(&self, project: &str) -> bool {
        self.builds
            .read()
            .unwrap()
            .keys()
            .any(|(name, _)| name == project)
    }

    fn find_build(&self, build: &BuildRef) -> Option<BuildHandle> {
        self.builds
            .read()
            .unwrap()
            .get(&(build.project.clone(), build.number))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resultwire_core::BuildOrigin;

    #[test]
    fn lookups_reflect_inserts_and_removals() {
        let source = InMemoryBuildSource::new();
        let build = BuildRef::new("alpha", 3);
        source.insert(BuildHandle::new(
            build.clone(),
            "/tmp/alpha/3",
            BuildOrigin::Plain,
        ));

        assert!(source.has_project("alpha"));
        assert!(source.find_build(&build).is_some());
        assert!(source.find_build(&BuildRef::new("alpha", 4)).is_none());

        source.remove(&build);
        assert!(!source.has_project("alpha"));
    }
}
