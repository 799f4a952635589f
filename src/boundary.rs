use std::fmt;

/// Warnings that occur at history boundaries (tags, generation markers).
/// These are non-fatal issues that should be reported to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// No library carries a last-generated marker; a placeholder start is used
    NoLastGeneratedCommit,
    /// A library has no last-generated marker and was left out of the window
    MissingLastGeneratedCommit { library_id: String },
    /// A library's previous release tag does not exist; full history was read
    MissingTag { library_id: String, tag: String },
    /// A release-triggered library has no qualifying commits since its tag
    NoQualifyingCommits { library_id: String, since_tag: String },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::NoLastGeneratedCommit => {
                write!(
                    f,
                    "No library has a last generated commit; the start of the commit range is unknown"
                )
            }
            BoundaryWarning::MissingLastGeneratedCommit { library_id } => {
                write!(f, "Library '{}' has no last generated commit", library_id)
            }
            BoundaryWarning::MissingTag { library_id, tag } => {
                write!(
                    f,
                    "Tag '{}' for library '{}' not found; reading full history",
                    tag, library_id
                )
            }
            BoundaryWarning::NoQualifyingCommits {
                library_id,
                since_tag,
            } if since_tag.is_empty() => {
                write!(f, "No qualifying commits for unreleased library '{}'", library_id)
            }
            BoundaryWarning::NoQualifyingCommits {
                library_id,
                since_tag,
            } => {
                write!(
                    f,
                    "No qualifying commits for library '{}' since tag '{}'",
                    library_id, since_tag
                )
            }
        }
    }
}
