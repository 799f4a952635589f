use crate::error::{LibrarianError, Result};
use crate::git::{touches_paths, CommitInfo, Repository};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Mock repository for testing without actual git operations.
///
/// Commits are kept newest first, like a revwalk from HEAD.
pub struct MockRepository {
    commits: Vec<(CommitInfo, Vec<String>)>,
    tags: HashMap<String, String>,
    working_changes: Vec<String>,
}

impl MockRepository {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        MockRepository {
            commits: Vec::new(),
            tags: HashMap::new(),
            working_changes: Vec::new(),
        }
    }

    /// Add a commit on top of the current history
    pub fn add_commit(&mut self, info: CommitInfo, files: Vec<String>) {
        self.commits.insert(0, (info, files));
    }

    /// Shorthand for [`add_commit`](Self::add_commit) from parts
    pub fn commit(
        &mut self,
        hash: &str,
        message: &str,
        when: DateTime<Utc>,
        files: &[&str],
    ) -> &mut Self {
        self.add_commit(
            CommitInfo {
                hash: hash.to_string(),
                message: message.to_string(),
                author: "Test Author".to_string(),
                when,
            },
            files.iter().map(|f| f.to_string()).collect(),
        );
        self
    }

    /// Add a tag pointing to a commit hash
    pub fn add_tag(&mut self, name: impl Into<String>, hash: impl Into<String>) {
        self.tags.insert(name.into(), hash.into());
    }

    /// Set the uncommitted working-tree changes
    pub fn set_working_changes<I, S>(&mut self, files: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.working_changes = files.into_iter().map(Into::into).collect();
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn find_tag(&self, tag_name: &str) -> Result<Option<String>> {
        Ok(self.tags.get(tag_name).cloned())
    }

    fn commits_since_commit(
        &self,
        since: Option<&str>,
        paths: &[String],
    ) -> Result<Vec<CommitInfo>> {
        let end = match since {
            Some(since) => self
                .commits
                .iter()
                .position(|(c, _)| c.hash == since)
                .ok_or_else(|| {
                    LibrarianError::Git(git2::Error::from_str(&format!(
                        "commit '{}' not found",
                        since
                    )))
                })?,
            None => self.commits.len(),
        };

        Ok(self.commits[..end]
            .iter()
            .filter(|(_, files)| touches_paths(files, paths))
            .map(|(c, _)| c.clone())
            .collect())
    }

    fn changed_files(&self, hash: &str) -> Result<Vec<String>> {
        self.commits
            .iter()
            .find(|(c, _)| c.hash == hash)
            .map(|(_, files)| files.clone())
            .ok_or_else(|| {
                LibrarianError::Git(git2::Error::from_str(&format!(
                    "commit '{}' not found",
                    hash
                )))
            })
    }

    fn get_commit(&self, hash: &str) -> Result<Option<CommitInfo>> {
        Ok(self
            .commits
            .iter()
            .find(|(c, _)| !hash.is_empty() && c.hash == hash)
            .map(|(c, _)| c.clone()))
    }

    fn working_changes(&self) -> Result<Vec<String>> {
        Ok(self.working_changes.clone())
    }
}
