//! Commit-override body for regeneration pull requests.
//!
//! Every qualifying upstream commit becomes one nested block, newest first,
//! between the override markers. The squash-merged pull request therefore
//! carries one logical commit per library change.

use crate::boundary::BoundaryWarning;
use crate::domain::commit::{
    short_hash, COMMIT_OVERRIDE_BEGIN, COMMIT_OVERRIDE_END, NESTED_COMMIT_BEGIN, NESTED_COMMIT_END,
    SOURCE_REVISION_FOOTER,
};
use crate::domain::{ConventionalCommit, LibraryReleaseContext};
use crate::notes::RepositoryIdentity;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Body used when no library has any new upstream commit
pub const NO_COMMITS_MESSAGE: &str = "No commits found since the last generation.";

/// A library's last-generated upstream revision with its commit time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationMarker {
    pub library_id: String,
    pub commit_hash: String,
    pub when: DateTime<Utc>,
}

/// Rendered body plus the non-fatal conditions met while rendering
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationBody {
    pub text: String,
    pub warnings: Vec<BoundaryWarning>,
}

#[derive(Debug, Clone)]
pub struct GenerationRenderer {
    upstream: RepositoryIdentity,
    tool_version: String,
    image: String,
}

impl GenerationRenderer {
    pub fn new(upstream: RepositoryIdentity, tool_version: impl Into<String>, image: impl Into<String>) -> Self {
        GenerationRenderer {
            upstream,
            tool_version: tool_version.into(),
            image: image.into(),
        }
    }

    /// Render the generation pull-request body.
    ///
    /// `markers` holds the resolved last-generated commits; libraries with an
    /// empty marker are skipped for the start boundary and reported.
    pub fn render(
        &self,
        libraries: &[LibraryReleaseContext],
        markers: &[GenerationMarker],
        commits_per_library: &BTreeMap<String, Vec<ConventionalCommit>>,
    ) -> GenerationBody {
        let mut warnings: Vec<BoundaryWarning> = libraries
            .iter()
            .filter(|lib| lib.last_generated_commit.is_empty())
            .map(|lib| BoundaryWarning::MissingLastGeneratedCommit {
                library_id: lib.id.clone(),
            })
            .collect();

        let start = start_boundary(libraries, markers);
        if start.is_none() {
            warnings.push(BoundaryWarning::NoLastGeneratedCommit);
        }

        let commits = newest_first(commits_per_library);
        let Some(end) = commits.first() else {
            return GenerationBody {
                text: NO_COMMITS_MESSAGE.to_string(),
                warnings,
            };
        };

        let mut out = String::new();
        self.write_preamble(&mut out, start.unwrap_or_default(), &end.commit_hash);

        let _ = writeln!(out, "{}", COMMIT_OVERRIDE_BEGIN);
        for commit in &commits {
            self.write_nested_block(&mut out, commit);
        }
        let _ = writeln!(out, "{}", COMMIT_OVERRIDE_END);

        GenerationBody {
            text: out,
            warnings,
        }
    }

    fn commit_link(&self, hash: &str) -> String {
        format!(
            "[{}@{}]({})",
            self.upstream.slug(),
            short_hash(hash),
            self.upstream.commit_url(hash)
        )
    }

    fn write_preamble(&self, out: &mut String, start: &str, end: &str) {
        let _ = writeln!(
            out,
            "This pull request is generated with proto changes between"
        );
        let _ = writeln!(out, "{}", self.commit_link(start));
        let _ = writeln!(out, "(exclusive) and");
        let _ = writeln!(out, "{}", self.commit_link(end));
        let _ = writeln!(out, "(inclusive).\n");
        let _ = writeln!(out, "Librarian Version: {}", self.tool_version);
        let _ = writeln!(out, "Language Image: {}\n", self.image);
    }

    fn write_nested_block(&self, out: &mut String, commit: &ConventionalCommit) {
        let _ = writeln!(out, "{}", NESTED_COMMIT_BEGIN);
        let _ = writeln!(
            out,
            "{}: [{}] {}",
            commit.r#type, commit.library_id, commit.description
        );
        if !commit.body.is_empty() {
            let _ = writeln!(out, "{}", commit.body);
        }
        let _ = writeln!(
            out,
            "\n{}: {}\n",
            SOURCE_REVISION_FOOTER,
            commit.footer(SOURCE_REVISION_FOOTER).unwrap_or_default()
        );
        let _ = writeln!(out, "Source-link: {}", self.commit_link(&commit.commit_hash));
        let _ = writeln!(out, "{}", NESTED_COMMIT_END);
    }
}

/// The most recently timestamped marker among libraries that have one.
///
/// Ties keep the first library in input order.
pub fn start_boundary<'a>(
    libraries: &[LibraryReleaseContext],
    markers: &'a [GenerationMarker],
) -> Option<&'a str> {
    let mut best: Option<&GenerationMarker> = None;
    for lib in libraries.iter().filter(|l| !l.last_generated_commit.is_empty()) {
        let Some(marker) = markers
            .iter()
            .find(|m| m.library_id == lib.id && m.commit_hash == lib.last_generated_commit)
        else {
            continue;
        };
        if best.map_or(true, |b| marker.when > b.when) {
            best = Some(marker);
        }
    }
    best.map(|m| m.commit_hash.as_str())
}

/// All commits across libraries, newest first; equal timestamps keep
/// library-id order and then enumeration order.
fn newest_first(commits_per_library: &BTreeMap<String, Vec<ConventionalCommit>>) -> Vec<&ConventionalCommit> {
    let mut all: Vec<&ConventionalCommit> = commits_per_library.values().flatten().collect();
    all.sort_by(|a, b| b.when.cmp(&a.when));
    all
}
