//! Path ownership rules deciding whether a commit matters to a library.
//!
//! Containment is computed on cleaned path components, never by string
//! prefix: `storage` does not contain `storagetransfer/x.go`.

use crate::domain::LibraryReleaseContext;
use std::path::{Component, Path, PathBuf};

/// Lexically clean a repository-relative path.
///
/// `.` segments vanish and `..` pops a preceding segment; leading `..`
/// segments that cannot be popped are kept. Root and prefix components are
/// dropped, as history paths are always relative to the repository.
fn clean(path: &str) -> PathBuf {
    let normalized = path.replace('\\', "/");
    let mut out = PathBuf::new();
    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(segment) => out.push(segment),
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    out
}

/// Whether `file` lies under `dir`, i.e. the relative path from `dir` to
/// `file` does not escape upward. A `dir` of `.` matches everything.
pub fn is_under(file: &str, dir: &str) -> bool {
    let dir = clean(dir);
    if dir.as_os_str().is_empty() {
        return true;
    }
    pathdiff::diff_paths(clean(file), &dir)
        .is_some_and(|rel| !matches!(rel.components().next(), Some(Component::ParentDir)))
}

/// True iff some changed file is under a source root and not under any
/// excluded path.
pub fn is_release_relevant<F, R, E>(files: &[F], source_roots: &[R], exclude_paths: &[E]) -> bool
where
    F: AsRef<str>,
    R: AsRef<str>,
    E: AsRef<str>,
{
    files.iter().any(|file| {
        let file = file.as_ref();
        source_roots.iter().any(|root| is_under(file, root.as_ref()))
            && !exclude_paths.iter().any(|ex| is_under(file, ex.as_ref()))
    })
}

/// True iff an upstream change touched one of the library's API paths and
/// the downstream output under its source roots changed as a result.
pub fn is_generation_relevant<U, D>(
    upstream_files: &[U],
    downstream_files: &[D],
    library: &LibraryReleaseContext,
) -> bool
where
    U: AsRef<str>,
    D: AsRef<str>,
{
    let upstream_changed = upstream_files.iter().any(|file| {
        library
            .api_paths
            .iter()
            .any(|api| is_under(file.as_ref(), api))
    });

    upstream_changed
        && is_release_relevant(
            downstream_files,
            &library.source_roots,
            &library.release_exclude_paths,
        )
}
