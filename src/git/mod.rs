//! Commit history abstraction layer
//!
//! The release and generation workflows read history through the
//! [Repository] trait so they can run against a real clone or an in-memory
//! fixture:
//!
//! - [repository::Git2Repository]: a local clone opened with the `git2` crate
//! - [mock::MockRepository]: an in-memory history for testing
//!
//! ```rust
//! # use librarian_release::git::Repository;
//! # fn example<R: Repository>(repo: &R) -> librarian_release::Result<()> {
//! let paths = vec!["google/cloud/storage".to_string()];
//! let since = repo.find_tag("storage-v1.2.0")?;
//! for commit in repo.commits_since_commit(since.as_deref(), &paths)? {
//!     println!("{}", commit.hash);
//! }
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use crate::domain::CommitInfo;
pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::domain::is_under;
use crate::error::Result;

/// Read-only access to commit history.
///
/// Commit lists are returned newest first. An empty `paths` slice means
/// "every path".
pub trait Repository {
    /// Resolve a tag to the hash of the commit it points at
    ///
    /// # Returns
    /// * `Ok(Some(hash))` - The tag exists
    /// * `Ok(None)` - No tag with that name
    fn find_tag(&self, tag_name: &str) -> Result<Option<String>>;

    /// Commits reachable from HEAD but not from `since`, touching `paths`.
    ///
    /// With `since` of `None` the full history is returned.
    fn commits_since_commit(&self, since: Option<&str>, paths: &[String])
        -> Result<Vec<CommitInfo>>;

    /// Files changed by a commit relative to its first parent
    fn changed_files(&self, hash: &str) -> Result<Vec<String>>;

    /// Look up a single commit; `Ok(None)` if it does not exist
    fn get_commit(&self, hash: &str) -> Result<Option<CommitInfo>>;

    /// Uncommitted changes in the working tree, as repository-relative paths
    fn working_changes(&self) -> Result<Vec<String>>;
}

/// Whether any of `files` lies under one of `paths`; an empty path set
/// matches everything.
pub(crate) fn touches_paths(files: &[String], paths: &[String]) -> bool {
    paths.is_empty()
        || files
            .iter()
            .any(|file| paths.iter().any(|path| is_under(file, path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touches_paths() {
        let files = vec!["google/cloud/storage/v2/storage.proto".to_string()];
        assert!(touches_paths(&files, &[]));
        assert!(touches_paths(&files, &["google/cloud/storage".to_string()]));
        assert!(!touches_paths(&files, &["google/cloud/stor".to_string()]));
        assert!(!touches_paths(&[], &["google".to_string()]));
    }
}
