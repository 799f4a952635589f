//! Release-notes rendering.
//!
//! A library's commits are grouped by type into a fixed section order and
//! rendered as one Markdown block; blocks for every release-triggered
//! library are then folded into a single pull-request body.

use crate::domain::ConventionalCommit;
use crate::notes::RepositoryIdentity;
use chrono::NaiveDate;
use std::fmt::Write;

/// Commit types that get a section, in render order, with their headings
pub const SECTIONS: [(&str, &str); 5] = [
    ("feat", "Features"),
    ("fix", "Bug Fixes"),
    ("perf", "Performance Improvements"),
    ("revert", "Reverts"),
    ("docs", "Documentation"),
];

/// One heading and the commits rendered under it
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSection<'a> {
    pub heading: &'static str,
    pub commits: Vec<&'a ConventionalCommit>,
}

/// Everything needed to render one library's block
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryNotes {
    pub library_id: String,
    pub previous_tag: String,
    pub new_tag: String,
    pub new_version: String,
    pub date: NaiveDate,
    pub commits: Vec<ConventionalCommit>,
    pub release_triggered: bool,
}

/// Group commits into the fixed section order, omitting empty sections.
///
/// Commits keep the order they were given in.
pub fn group_sections(commits: &[ConventionalCommit]) -> Vec<RenderedSection<'_>> {
    SECTIONS
        .iter()
        .map(|(commit_type, heading)| RenderedSection {
            heading: *heading,
            commits: commits
                .iter()
                .filter(|c| c.r#type == *commit_type)
                .collect(),
        })
        .filter(|section| !section.commits.is_empty())
        .collect()
}

/// Renders release notes with links into the hosting repository
#[derive(Debug, Clone)]
pub struct ReleaseNoteRenderer {
    repository: RepositoryIdentity,
}

impl ReleaseNoteRenderer {
    pub fn new(repository: RepositoryIdentity) -> Self {
        ReleaseNoteRenderer { repository }
    }

    /// Render the header line and sections for one library.
    ///
    /// An empty `previous_tag` marks a first release, whose header links to
    /// the new tag alone.
    pub fn render_library(
        &self,
        commits: &[ConventionalCommit],
        previous_tag: &str,
        new_tag: &str,
        new_version: &str,
        date: NaiveDate,
    ) -> String {
        let link = if previous_tag.is_empty() {
            self.repository.tree_url(new_tag)
        } else {
            self.repository.compare_url(previous_tag, new_tag)
        };

        let mut out = String::new();
        let _ = writeln!(
            out,
            "## [{}]({}) ({})",
            new_version,
            link,
            date.format("%Y-%m-%d")
        );

        for section in group_sections(commits) {
            let _ = writeln!(out, "\n### {}\n", section.heading);
            for commit in section.commits {
                let _ = writeln!(
                    out,
                    "* {} ([{}]({}))",
                    commit.description,
                    commit.short_hash(),
                    self.repository.commit_url(&commit.commit_hash)
                );
            }
        }

        out
    }

    /// Render the full pull-request body for all release-triggered libraries
    pub fn render_aggregate(&self, libraries: &[LibraryNotes], image: &str, tool_version: &str) -> String {
        let mut triggered: Vec<&LibraryNotes> =
            libraries.iter().filter(|l| l.release_triggered).collect();
        triggered.sort_by(|a, b| a.library_id.cmp(&b.library_id));

        let mut out = String::new();
        let _ = writeln!(out, "Librarian Version: {}", tool_version);
        let _ = writeln!(out, "Language Image: {}", image);
        out.push('\n');

        for notes in triggered {
            let _ = writeln!(
                out,
                "<details><summary>{}: {}</summary>\n",
                notes.library_id, notes.new_version
            );
            out.push_str(&self.render_library(
                &notes.commits,
                &notes.previous_tag,
                &notes.new_tag,
                &notes.new_version,
                notes.date,
            ));
            out.push_str("\n</details>\n");
        }

        out
    }
}
