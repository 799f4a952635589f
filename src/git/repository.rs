use crate::error::{LibrarianError, Result};
use crate::git::{touches_paths, CommitInfo};
use chrono::DateTime;
use git2::{DiffOptions, ErrorCode, Oid, Repository as Git2Repo, Sort, StatusOptions};
use std::path::Path;
use tracing::debug;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    fn commit_info(commit: &git2::Commit<'_>) -> CommitInfo {
        CommitInfo {
            hash: commit.id().to_string(),
            message: commit.message().unwrap_or("(empty message)").to_string(),
            author: commit.author().name().unwrap_or("unknown").to_string(),
            when: DateTime::from_timestamp(commit.time().seconds(), 0).unwrap_or_default(),
        }
    }

    fn resolve_oid(&self, hash: &str) -> Result<Oid> {
        let object = self.repo.revparse_single(hash)?;
        Ok(object.peel_to_commit()?.id())
    }

    fn diff_paths(&self, oid: Oid) -> Result<Vec<String>> {
        let commit = self.repo.find_commit(oid)?;
        let tree = commit.tree()?;
        let parent_tree = if commit.parent_count() > 0 {
            Some(commit.parent(0)?.tree()?)
        } else {
            None
        };

        let mut opts = DiffOptions::new();
        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut opts))?;

        let mut files = Vec::new();
        for delta in diff.deltas() {
            let path = delta.new_file().path().or_else(|| delta.old_file().path());
            if let Some(path) = path {
                let path = path.to_string_lossy().replace('\\', "/");
                if !files.contains(&path) {
                    files.push(path);
                }
            }
        }
        Ok(files)
    }
}

impl super::Repository for Git2Repository {
    fn find_tag(&self, tag_name: &str) -> Result<Option<String>> {
        let reference_name = format!("refs/tags/{}", tag_name);

        match self.repo.find_reference(&reference_name) {
            Ok(reference) => {
                let commit = reference
                    .peel_to_commit()
                    .map_err(|e| LibrarianError::tag(format!("Cannot peel tag: {}", e)))?;

                Ok(Some(commit.id().to_string()))
            }
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(LibrarianError::tag(format!(
                "Cannot find tag '{}': {}",
                tag_name, e
            ))),
        }
    }

    fn commits_since_commit(
        &self,
        since: Option<&str>,
        paths: &[String],
    ) -> Result<Vec<CommitInfo>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push_head()?;

        if let Some(since) = since {
            revwalk.hide(self.resolve_oid(since)?)?;
        }

        let mut commits = Vec::new();

        for oid_result in revwalk {
            let oid = oid_result?;

            if !paths.is_empty() && !touches_paths(&self.diff_paths(oid)?, paths) {
                continue;
            }

            let commit = self.repo.find_commit(oid)?;
            commits.push(Self::commit_info(&commit));
        }

        debug!(
            since = since.unwrap_or("<root>"),
            paths = paths.len(),
            count = commits.len(),
            "Enumerated commits"
        );

        Ok(commits)
    }

    fn changed_files(&self, hash: &str) -> Result<Vec<String>> {
        let oid = self.resolve_oid(hash)?;
        self.diff_paths(oid)
    }

    fn get_commit(&self, hash: &str) -> Result<Option<CommitInfo>> {
        if hash.is_empty() {
            return Ok(None);
        }
        match self.repo.revparse_single(hash) {
            Ok(object) => {
                let commit = object.peel_to_commit()?;
                Ok(Some(Self::commit_info(&commit)))
            }
            Err(e) if matches!(e.code(), ErrorCode::NotFound | ErrorCode::InvalidSpec) => {
                debug!(hash, "Commit not found");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn working_changes(&self) -> Result<Vec<String>> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut opts))?;
        Ok(statuses
            .iter()
            .filter_map(|entry| entry.path().map(str::to_string))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::Repository;
    use git2::Signature;
    use std::fs;
    use tempfile::TempDir;

    fn commit_file(repo: &Git2Repo, dir: &Path, file: &str, message: &str, time: i64) -> Oid {
        let full = dir.join(file);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full, message).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(file)).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = Signature::new("Test", "test@example.com", &git2::Time::new(time, 0)).unwrap();
        let parents: Vec<git2::Commit<'_>> = match repo.head() {
            Ok(head) => vec![head.peel_to_commit().unwrap()],
            Err(_) => Vec::new(),
        };
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }

    #[test]
    fn test_history_queries() {
        let dir = TempDir::new().unwrap();
        let raw = Git2Repo::init(dir.path()).unwrap();

        let first = commit_file(&raw, dir.path(), "alpha/a.txt", "feat: first", 1_000);
        raw.tag_lightweight("alpha-v1.0.0", &raw.find_object(first, None).unwrap(), false)
            .unwrap();
        let second = commit_file(&raw, dir.path(), "beta/b.txt", "fix: second", 2_000);
        let third = commit_file(&raw, dir.path(), "alpha/c.txt", "fix: third", 3_000);

        let repo = Git2Repository::from_git2(raw);

        assert_eq!(repo.find_tag("alpha-v1.0.0").unwrap(), Some(first.to_string()));
        assert_eq!(repo.find_tag("missing").unwrap(), None);

        let all = repo.commits_since_commit(None, &[]).unwrap();
        let hashes: Vec<&str> = all.iter().map(|c| c.hash.as_str()).collect();
        assert_eq!(
            hashes,
            vec![third.to_string(), second.to_string(), first.to_string()]
        );
        assert_eq!(all[0].when.timestamp(), 3_000);

        let alpha = repo
            .commits_since_commit(Some(first.to_string().as_str()), &["alpha".to_string()])
            .unwrap();
        assert_eq!(alpha.len(), 1);
        assert_eq!(alpha[0].message, "fix: third");

        assert_eq!(
            repo.changed_files(&second.to_string()).unwrap(),
            vec!["beta/b.txt".to_string()]
        );
        assert_eq!(
            repo.changed_files(&first.to_string()).unwrap(),
            vec!["alpha/a.txt".to_string()]
        );

        let found = repo.get_commit(&second.to_string()).unwrap().unwrap();
        assert_eq!(found.message, "fix: second");
        assert!(repo.get_commit("0123456789abcdef0123456789abcdef01234567").unwrap().is_none());
        assert!(repo.get_commit("").unwrap().is_none());
    }

    #[test]
    fn test_working_changes() {
        let dir = TempDir::new().unwrap();
        let raw = Git2Repo::init(dir.path()).unwrap();
        commit_file(&raw, dir.path(), "alpha/a.txt", "feat: first", 1_000);
        fs::write(dir.path().join("alpha/a.txt"), "changed").unwrap();
        fs::create_dir_all(dir.path().join("beta")).unwrap();
        fs::write(dir.path().join("beta/new.txt"), "new").unwrap();

        let repo = Git2Repository::from_git2(raw);
        let mut changes = repo.working_changes().unwrap();
        changes.sort();
        assert_eq!(changes, vec!["alpha/a.txt".to_string(), "beta/new.txt".to_string()]);
    }
}
