//! Main workflow orchestration logic
//!
//! Wires the commit source, classifier, version derivation, renderers and
//! overflow delivery together. The CLI in `main.rs` only parses arguments,
//! builds collaborators and prints the outcome.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::analyzer::VersionAnalyzer;
use crate::boundary::BoundaryWarning;
use crate::config::Config;
use crate::domain::commit::attributed_libraries;
use crate::domain::{
    classify, is_generation_relevant, is_release_relevant, ConventionalCommit,
    LibraryReleaseContext,
};
use crate::error::{LibrarianError, Result};
use crate::git::Repository;
use crate::notes::{GenerationMarker, GenerationRenderer, LibraryNotes, ReleaseNoteRenderer};
use crate::overflow::{GistStore, OverflowDelivery};

/// Run-wide inputs that are not part of the configuration file
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowOptions {
    /// Tool version echoed in pull-request preambles
    pub tool_version: String,

    /// Release date printed in release-note headers
    pub date: NaiveDate,
}

/// Version decision for one release-triggered library
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryRelease {
    pub library_id: String,
    pub current_version: String,
    pub next_version: String,
    pub previous_tag: String,
    pub new_tag: String,
    pub commit_count: usize,
}

/// Result of the release-notes workflow
#[derive(Debug)]
pub struct ReleaseOutcome {
    /// Delivered pull-request body (inline or an overflow reference)
    pub body: String,

    pub releases: Vec<LibraryRelease>,

    /// Library state after the run, with bumped versions
    pub libraries: Vec<LibraryReleaseContext>,

    /// Libraries that were aborted, each error naming its library
    pub failures: Vec<LibrarianError>,

    pub warnings: Vec<BoundaryWarning>,
}

/// Result of the generation-body workflow
#[derive(Debug)]
pub struct GenerationOutcome {
    pub body: String,
    pub commit_counts: BTreeMap<String, usize>,
    pub failures: Vec<LibrarianError>,
    pub warnings: Vec<BoundaryWarning>,
}

/// Release-notes workflow
///
/// For every release-triggered library:
/// 1. Enumerate commits since the library's current tag
/// 2. Keep commits attributed to it or touching its source roots
/// 3. Classify them and derive the next version
/// 4. Render its block
///
/// The aggregate body is then passed through overflow delivery. A library
/// whose version cannot be derived is reported in `failures` and left out;
/// delivery errors abort the whole run.
pub async fn run_release_notes<R, S>(
    repo: &R,
    config: &Config,
    delivery: &OverflowDelivery<S>,
    options: &WorkflowOptions,
) -> Result<ReleaseOutcome>
where
    R: Repository,
    S: GistStore,
{
    let pattern = config.tag_pattern()?;
    let analyzer = VersionAnalyzer::new();
    let renderer = ReleaseNoteRenderer::new(config.repository.clone());

    let mut libraries = config.libraries.clone();
    let mut notes = Vec::new();
    let mut releases = Vec::new();
    let mut failures = Vec::new();
    let mut warnings = Vec::new();

    for library in libraries.iter_mut().filter(|l| l.release_triggered) {
        // An unreleased library has no previous tag.
        let previous_tag = if library.current_version.is_empty() {
            String::new()
        } else {
            pattern.format(&library.id, &library.current_version)
        };

        let commits = match release_commits(repo, library, &previous_tag, &mut warnings) {
            Ok(commits) => commits,
            Err(e) => {
                warn!(library = %library.id, error = %e, "Skipping library");
                failures.push(e.for_library(&library.id, "collect release commits"));
                continue;
            }
        };

        let next_version = match analyzer.next_version(&commits, &library.current_version) {
            Ok(version) => version,
            Err(e) => {
                warn!(library = %library.id, error = %e, "Skipping library");
                failures.push(e.for_library(&library.id, "derive next version"));
                continue;
            }
        };

        if commits.is_empty() {
            warnings.push(BoundaryWarning::NoQualifyingCommits {
                library_id: library.id.clone(),
                since_tag: previous_tag.clone(),
            });
        }

        let new_tag = pattern.format(&library.id, &next_version);
        info!(
            library = %library.id,
            current = %library.current_version,
            next = %next_version,
            commits = commits.len(),
            "Derived next version"
        );

        releases.push(LibraryRelease {
            library_id: library.id.clone(),
            current_version: library.current_version.clone(),
            next_version: next_version.clone(),
            previous_tag: previous_tag.clone(),
            new_tag: new_tag.clone(),
            commit_count: commits.len(),
        });
        notes.push(LibraryNotes {
            library_id: library.id.clone(),
            previous_tag,
            new_tag,
            new_version: next_version.clone(),
            date: options.date,
            commits,
            release_triggered: true,
        });
        library.current_version = next_version;
    }

    let rendered = renderer.render_aggregate(&notes, &config.image, &options.tool_version);
    let body = delivery.deliver(&rendered).await?;

    Ok(ReleaseOutcome {
        body,
        releases,
        libraries,
        failures,
        warnings,
    })
}

/// Classified commits for one library since `previous_tag`.
///
/// An empty tag or a missing one reads the full history; only the missing
/// tag is worth a warning.
fn release_commits<R: Repository>(
    repo: &R,
    library: &LibraryReleaseContext,
    previous_tag: &str,
    warnings: &mut Vec<BoundaryWarning>,
) -> Result<Vec<ConventionalCommit>> {
    let since = if previous_tag.is_empty() {
        None
    } else {
        let found = repo.find_tag(previous_tag)?;
        if found.is_none() {
            warnings.push(BoundaryWarning::MissingTag {
                library_id: library.id.clone(),
                tag: previous_tag.to_string(),
            });
        }
        found
    };

    let mut commits = Vec::new();
    for commit in repo.commits_since_commit(since.as_deref(), &[])? {
        let attributed = attributed_libraries(&commit.message).contains(&library.id);
        if !attributed {
            let files = repo.changed_files(&commit.hash)?;
            if !is_release_relevant(
                &files,
                &library.source_roots,
                &library.release_exclude_paths,
            ) {
                continue;
            }
        }

        commits.extend(
            classify(&commit, &library.id)
                .into_iter()
                .filter(|c| c.applies_to(&library.id)),
        );
    }

    debug!(library = %library.id, count = commits.len(), "Collected release commits");
    Ok(commits)
}

/// Generation-body workflow
///
/// For every library with a last-generated marker, enumerate upstream
/// commits since that marker touching its API paths, keep those for which
/// the downstream output under its source roots changed, classify and
/// render them, then deliver the body.
pub async fn run_generation_body<R, S>(
    upstream: &R,
    downstream_changes: &[String],
    config: &Config,
    delivery: &OverflowDelivery<S>,
    options: &WorkflowOptions,
) -> Result<GenerationOutcome>
where
    R: Repository,
    S: GistStore,
{
    let renderer = GenerationRenderer::new(
        config.upstream.clone(),
        options.tool_version.clone(),
        config.image.clone(),
    );

    let mut markers = Vec::new();
    let mut per_library = BTreeMap::new();
    let mut failures = Vec::new();

    for library in config
        .libraries
        .iter()
        .filter(|l| !l.last_generated_commit.is_empty())
    {
        match generation_commits(upstream, library, downstream_changes) {
            Ok((marker, commits)) => {
                markers.push(marker);
                per_library.insert(library.id.clone(), commits);
            }
            Err(e) => {
                warn!(library = %library.id, error = %e, "Skipping library");
                failures.push(e.for_library(&library.id, "collect generation commits"));
            }
        }
    }

    let rendered = renderer.render(&config.libraries, &markers, &per_library);
    for warning in &rendered.warnings {
        debug!(%warning, "Generation boundary warning");
    }

    let body = delivery.deliver(&rendered.text).await?;
    let commit_counts = per_library
        .iter()
        .map(|(id, commits)| (id.clone(), commits.len()))
        .collect();

    Ok(GenerationOutcome {
        body,
        commit_counts,
        failures,
        warnings: rendered.warnings,
    })
}

fn generation_commits<R: Repository>(
    upstream: &R,
    library: &LibraryReleaseContext,
    downstream_changes: &[String],
) -> Result<(GenerationMarker, Vec<ConventionalCommit>)> {
    let marker_commit = upstream
        .get_commit(&library.last_generated_commit)?
        .ok_or_else(|| {
            LibrarianError::Git(git2::Error::from_str(&format!(
                "last generated commit '{}' not found",
                library.last_generated_commit
            )))
        })?;

    let marker = GenerationMarker {
        library_id: library.id.clone(),
        commit_hash: library.last_generated_commit.clone(),
        when: marker_commit.when,
    };

    let mut commits = Vec::new();
    for commit in upstream.commits_since_commit(Some(&marker.commit_hash), &library.api_paths)? {
        let files = upstream.changed_files(&commit.hash)?;
        if !is_generation_relevant(&files, downstream_changes, library) {
            continue;
        }
        commits.extend(
            classify(&commit, &library.id)
                .into_iter()
                .filter(|c| c.applies_to(&library.id)),
        );
    }

    debug!(library = %library.id, count = commits.len(), "Collected generation commits");
    Ok((marker, commits))
}
