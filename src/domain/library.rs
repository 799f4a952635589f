use serde::{Deserialize, Serialize};

/// Per-library view of durable state for one run.
///
/// Loaded once, mutated in memory (version bump, triggered flag) and handed
/// back to the caller for persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LibraryReleaseContext {
    pub id: String,

    /// Current semantic version; empty for libraries never released
    #[serde(default, rename = "version")]
    pub current_version: String,

    /// Directories owned by this library
    #[serde(default)]
    pub source_roots: Vec<String>,

    /// Sub-paths of `source_roots` that never trigger a release
    #[serde(default)]
    pub release_exclude_paths: Vec<String>,

    /// Upstream interface-definition directories that trigger generation
    #[serde(default)]
    pub api_paths: Vec<String>,

    /// Upstream revision the library was last generated from; may be empty
    #[serde(default)]
    pub last_generated_commit: String,

    #[serde(default)]
    pub release_triggered: bool,
}

impl LibraryReleaseContext {
    pub fn new(id: impl Into<String>, current_version: impl Into<String>) -> Self {
        LibraryReleaseContext {
            id: id.into(),
            current_version: current_version.into(),
            ..Default::default()
        }
    }

    pub fn with_source_roots<I, S>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source_roots = roots.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_release_exclude_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.release_exclude_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_api_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.api_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_last_generated_commit(mut self, commit: impl Into<String>) -> Self {
        self.last_generated_commit = commit.into();
        self
    }

    pub fn triggered(mut self) -> Self {
        self.release_triggered = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let lib = LibraryReleaseContext::new("storage", "1.2.3")
            .with_source_roots(["storage"])
            .with_release_exclude_paths(["storage/internal/generated/snippets"])
            .with_api_paths(["google/storage/v2"])
            .with_last_generated_commit("abc")
            .triggered();
        assert_eq!(lib.id, "storage");
        assert_eq!(lib.current_version, "1.2.3");
        assert_eq!(lib.source_roots, vec!["storage"]);
        assert_eq!(lib.api_paths, vec!["google/storage/v2"]);
        assert!(lib.release_triggered);
    }

    #[test]
    fn test_deserialize_defaults() {
        let lib: LibraryReleaseContext = toml::from_str(r#"id = "pubsub""#).unwrap();
        assert_eq!(lib.id, "pubsub");
        assert!(lib.current_version.is_empty());
        assert!(lib.source_roots.is_empty());
        assert!(!lib.release_triggered);
    }
}
