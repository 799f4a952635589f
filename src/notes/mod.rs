//! Markdown rendering of pull-request bodies
//!
//! - `release` - per-library release notes and their aggregate
//! - `generation` - commit-override body for regeneration pull requests

pub mod generation;
pub mod release;

pub use generation::{GenerationBody, GenerationMarker, GenerationRenderer};
pub use release::{LibraryNotes, ReleaseNoteRenderer, RenderedSection};

use serde::{Deserialize, Serialize};

/// Hosting identity used to build compare and commit hyperlinks
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RepositoryIdentity {
    #[serde(default = "default_host")]
    pub host: String,
    pub owner: String,
    pub name: String,
}

fn default_host() -> String {
    "https://github.com".to_string()
}

impl RepositoryIdentity {
    pub fn new(host: impl Into<String>, owner: impl Into<String>, name: impl Into<String>) -> Self {
        RepositoryIdentity {
            host: host.into().trim_end_matches('/').to_string(),
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// A repository hosted on github.com
    pub fn github(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(default_host(), owner, name)
    }

    fn base(&self) -> String {
        format!(
            "{}/{}/{}",
            self.host.trim_end_matches('/'),
            self.owner,
            self.name
        )
    }

    pub fn commit_url(&self, hash: &str) -> String {
        format!("{}/commit/{}", self.base(), hash)
    }

    pub fn compare_url(&self, from: &str, to: &str) -> String {
        format!("{}/compare/{}...{}", self.base(), from, to)
    }

    pub fn tree_url(&self, reference: &str) -> String {
        format!("{}/tree/{}", self.base(), reference)
    }

    /// `owner/name`, as used in cross-repository commit references
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}
