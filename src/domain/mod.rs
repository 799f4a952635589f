//! Domain logic - pure business rules independent of git and network operations

pub mod commit;
pub mod library;
pub mod paths;
pub mod tag;
pub mod version;

pub use commit::{classify, CommitInfo, ConventionalCommit, Footer};
pub use library::LibraryReleaseContext;
pub use paths::{is_generation_relevant, is_release_relevant, is_under};
pub use tag::TagPattern;
pub use version::{ChangeLevel, Version};
