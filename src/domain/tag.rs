use crate::error::{LibrarianError, Result};

/// Default per-library tag format
pub const DEFAULT_TAG_FORMAT: &str = "{id}-v{version}";

/// Tag naming pattern (e.g., "{id}-v{version}", "v{version}")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPattern {
    pub pattern: String,
}

impl TagPattern {
    /// Create a new tag pattern
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        if !pattern.contains("{version}") {
            return Err(LibrarianError::tag(format!(
                "Pattern '{}' must contain {{version}} placeholder",
                pattern
            )));
        }
        Ok(TagPattern { pattern })
    }

    /// Format a library version according to the pattern.
    /// Example: pattern="{id}-v{version}" -> "storage-v1.2.3"
    pub fn format(&self, library_id: &str, version: &str) -> String {
        self.pattern
            .replace("{id}", library_id)
            .replace("{version}", version)
    }
}

impl Default for TagPattern {
    fn default() -> Self {
        TagPattern {
            pattern: DEFAULT_TAG_FORMAT.to_string(),
        }
    }
}
