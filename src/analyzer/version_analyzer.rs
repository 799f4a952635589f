use crate::domain::{ChangeLevel, ConventionalCommit, Version};
use crate::error::Result;

/// Derives the next version of a library from its classified commits
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionAnalyzer;

impl VersionAnalyzer {
    /// Create a new version analyzer
    pub fn new() -> Self {
        VersionAnalyzer
    }

    /// Change level of a single commit.
    ///
    /// Nested commits are regenerated-library commits whose own type is not
    /// trusted, so they always count as `Minor`.
    pub fn change_level(commit: &ConventionalCommit) -> ChangeLevel {
        if commit.is_nested {
            return ChangeLevel::Minor;
        }
        if !commit.is_known_type() {
            return ChangeLevel::None;
        }
        if commit.is_breaking {
            return ChangeLevel::Major;
        }
        match commit.r#type.as_str() {
            "feat" => ChangeLevel::Minor,
            "fix" => ChangeLevel::Patch,
            _ => ChangeLevel::None,
        }
    }

    /// Highest change level across all commits
    pub fn highest_change(&self, commits: &[ConventionalCommit]) -> ChangeLevel {
        commits
            .iter()
            .map(Self::change_level)
            .fold(ChangeLevel::None, std::cmp::max)
    }

    /// Compute the next version string for `current_version`.
    ///
    /// An empty current version bumps from `0.0.0`; with no qualifying change
    /// the current version is returned untouched.
    pub fn next_version(&self, commits: &[ConventionalCommit], current_version: &str) -> Result<String> {
        let highest = self.highest_change(commits);
        if highest == ChangeLevel::None {
            if !current_version.is_empty() {
                Version::parse(current_version)?;
            }
            return Ok(current_version.to_string());
        }

        let current = if current_version.is_empty() {
            Version::new(0, 0, 0)
        } else {
            Version::parse(current_version)?
        };

        Ok(current.bump(Self::effective_level(&current, highest))?.to_string())
    }

    /// Apply the pre-GA rule: a `0.x` library never auto-advances to `1.0.0`.
    pub fn effective_level(current: &Version, highest: ChangeLevel) -> ChangeLevel {
        if current.is_pre_ga() && highest == ChangeLevel::Major {
            ChangeLevel::Minor
        } else {
            highest
        }
    }
}
