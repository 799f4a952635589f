use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{NaiveDate, TimeZone, Utc};
use git2::{Oid, Repository as Git2Repo, Signature, Time};
use tempfile::TempDir;

use librarian_release::cli::{run_generation_body, run_release_notes, WorkflowOptions};
use librarian_release::config::Config;
use librarian_release::domain::{classify, CommitInfo, LibraryReleaseContext};
use librarian_release::git::Git2Repository;
use librarian_release::notes::generation::NO_COMMITS_MESSAGE;
use librarian_release::notes::{GenerationRenderer, RepositoryIdentity};
use librarian_release::overflow::{MemoryGistStore, OverflowDelivery};

/// Throwaway git repository with a linear history
struct TestRepo {
    dir: TempDir,
    repo: Git2Repo,
    clock: i64,
}

impl TestRepo {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let repo = Git2Repo::init(dir.path()).unwrap();
        TestRepo {
            dir,
            repo,
            clock: 1_700_000_000,
        }
    }

    fn commit(&mut self, files: &[&str], message: &str) -> Oid {
        for file in files {
            let full = self.dir.path().join(file);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(&full, format!("{}\n{}", file, self.clock)).unwrap();
        }

        let mut index = self.repo.index().unwrap();
        for file in files {
            index.add_path(Path::new(file)).unwrap();
        }
        index.write().unwrap();
        let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();

        self.clock += 60;
        let sig = Signature::new("Test", "test@example.com", &Time::new(self.clock, 0)).unwrap();
        let parent = self.repo.head().ok().map(|h| h.peel_to_commit().unwrap());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    fn tag(&self, name: &str, oid: Oid) {
        let object = self.repo.find_object(oid, None).unwrap();
        self.repo.tag_lightweight(name, &object, false).unwrap();
    }

    fn open(&self) -> Git2Repository {
        Git2Repository::open(self.dir.path()).unwrap()
    }
}

fn options() -> WorkflowOptions {
    WorkflowOptions {
        tool_version: "v0.9.0".to_string(),
        date: NaiveDate::from_ymd_opt(2025, 5, 6).unwrap(),
    }
}

fn downstream_config(libraries: Vec<LibraryReleaseContext>) -> Config {
    Config {
        repository: RepositoryIdentity::github("googleapis", "google-cloud-go"),
        image: "gcr.io/librarian-go:1".to_string(),
        libraries,
        ..Config::default()
    }
}

#[tokio::test]
async fn test_release_notes_from_git_history() {
    let mut repo = TestRepo::new();
    let release = repo.commit(&["storage/a.go", "pubsub/a.go"], "chore: initial release");
    repo.tag("storage-v0.5.2", release);
    repo.tag("pubsub-v1.0.0", release);

    repo.commit(&["storage/b.go"], "feat(storage)!: drop legacy client");
    repo.commit(&["pubsub/b.go"], "fix: retry on unavailable");
    repo.commit(&["pubsub/internal/gen.go"], "feat: regenerate internals");
    repo.commit(&["README.md"], "docs: top-level readme");

    let config = downstream_config(vec![
        LibraryReleaseContext::new("storage", "0.5.2")
            .with_source_roots(["storage"])
            .triggered(),
        LibraryReleaseContext::new("pubsub", "1.0.0")
            .with_source_roots(["pubsub"])
            .with_release_exclude_paths(["pubsub/internal"])
            .triggered(),
    ]);
    let delivery = OverflowDelivery::new(MemoryGistStore::new(), 0);

    let outcome = run_release_notes(&repo.open(), &config, &delivery, &options())
        .await
        .unwrap();

    let versions: Vec<(&str, &str)> = outcome
        .releases
        .iter()
        .map(|r| (r.library_id.as_str(), r.next_version.as_str()))
        .collect();
    // Pre-GA storage gets a minor bump for its breaking change
    assert_eq!(versions, vec![("storage", "0.6.0"), ("pubsub", "1.0.1")]);

    let body = &outcome.body;
    assert!(body.starts_with("Librarian Version: v0.9.0\nLanguage Image: gcr.io/librarian-go:1\n\n"));
    let pubsub = body.find("<details><summary>pubsub: 1.0.1</summary>").unwrap();
    let storage = body.find("<details><summary>storage: 0.6.0</summary>").unwrap();
    assert!(pubsub < storage);
    assert!(body.contains(
        "## [0.6.0](https://github.com/googleapis/google-cloud-go/compare/storage-v0.5.2...storage-v0.6.0) (2025-05-06)"
    ));
    assert!(body.contains("* drop legacy client"));
    assert!(body.contains("* retry on unavailable"));
    assert!(!body.contains("regenerate internals"));
    assert!(!body.contains("top-level readme"));
    assert!(outcome.warnings.is_empty());
    assert!(outcome.failures.is_empty());
}

#[tokio::test]
async fn test_release_reads_merged_generation_pull_request() {
    let mut repo = TestRepo::new();
    let release = repo.commit(&["storage/a.go"], "chore: initial release");
    repo.tag("storage-v1.2.0", release);

    repo.commit(
        &["storage/apiv2/client.go"],
        "chore: regenerate storage (#101)\n\
         \n\
         This pull request is generated with proto changes between\n\
         \n\
         BEGIN_COMMIT_OVERRIDE\n\
         BEGIN_NESTED_COMMIT\n\
         fix: [storage] correct retry settings\n\
         \n\
         PiperOrigin-RevId: 700000001\n\
         \n\
         Source-link: [googleapis/googleapis@abcdef1](https://github.com/googleapis/googleapis/commit/abcdef1)\n\
         END_NESTED_COMMIT\n\
         BEGIN_NESTED_COMMIT\n\
         docs: [storage] clarify bucket docs\n\
         END_NESTED_COMMIT\n\
         END_COMMIT_OVERRIDE\n",
    );

    let config = downstream_config(vec![LibraryReleaseContext::new("storage", "1.2.0")
        .with_source_roots(["storage"])
        .triggered()]);
    let delivery = OverflowDelivery::new(MemoryGistStore::new(), 0);

    let outcome = run_release_notes(&repo.open(), &config, &delivery, &options())
        .await
        .unwrap();

    assert_eq!(outcome.releases[0].next_version, "1.3.0");
    assert_eq!(outcome.releases[0].commit_count, 2);
    assert!(outcome.body.contains("### Bug Fixes"));
    assert!(outcome.body.contains("* [storage] correct retry settings"));
    assert!(outcome.body.contains("### Documentation"));
}

fn library_block<'a>(body: &'a str, summary: &str) -> &'a str {
    let start = body.find(summary).unwrap();
    let end = start + body[start..].find("</details>").unwrap();
    &body[start..end]
}

#[tokio::test]
async fn test_release_splits_merged_generation_pull_request_by_library() {
    let upstream_commit = |hash: &str, message: &str| CommitInfo {
        hash: hash.to_string(),
        message: message.to_string(),
        author: "Upstream".to_string(),
        when: Utc.with_ymd_and_hms(2025, 4, 1, 12, 0, 0).unwrap(),
    };
    let libraries = vec![
        LibraryReleaseContext::new("alpha", "1.0.0")
            .with_source_roots(["alpha"])
            .triggered(),
        LibraryReleaseContext::new("beta", "1.0.0")
            .with_source_roots(["beta"])
            .triggered(),
    ];
    let mut per_library = BTreeMap::new();
    per_library.insert(
        "alpha".to_string(),
        classify(
            &upstream_commit("aaaaaaa111111", "feat: add alpha field\n\nPiperOrigin-RevId: 1"),
            "alpha",
        ),
    );
    per_library.insert(
        "beta".to_string(),
        classify(
            &upstream_commit("bbbbbbb222222", "fix: repair beta field\n\nPiperOrigin-RevId: 2"),
            "beta",
        ),
    );
    let generated = GenerationRenderer::new(
        RepositoryIdentity::github("googleapis", "googleapis"),
        "v0.9.0",
        "gcr.io/librarian-go:1",
    )
    .render(&libraries, &[], &per_library);

    let mut repo = TestRepo::new();
    let release = repo.commit(&["alpha/a.go", "beta/a.go"], "chore: initial release");
    repo.tag("alpha-v1.0.0", release);
    repo.tag("beta-v1.0.0", release);
    repo.commit(
        &["alpha/gen.go", "beta/gen.go"],
        &format!("chore: regenerate libraries (#42)\n\n{}", generated.text),
    );

    let config = downstream_config(libraries);
    let delivery = OverflowDelivery::new(MemoryGistStore::new(), 0);
    let outcome = run_release_notes(&repo.open(), &config, &delivery, &options())
        .await
        .unwrap();

    let counts: Vec<(&str, usize, &str)> = outcome
        .releases
        .iter()
        .map(|r| (r.library_id.as_str(), r.commit_count, r.next_version.as_str()))
        .collect();
    assert_eq!(counts, vec![("alpha", 1, "1.1.0"), ("beta", 1, "1.1.0")]);

    let alpha = library_block(&outcome.body, "<details><summary>alpha: 1.1.0</summary>");
    assert!(alpha.contains("[alpha] add alpha field"));
    assert!(!alpha.contains("repair beta field"));

    let beta = library_block(&outcome.body, "<details><summary>beta: 1.1.0</summary>");
    assert!(beta.contains("[beta] repair beta field"));
    assert!(!beta.contains("add alpha field"));
}

#[tokio::test]
async fn test_release_overflow_round_trip() {
    let mut repo = TestRepo::new();
    for i in 0..20 {
        repo.commit(&[&format!("storage/f{}.go", i)], &format!("feat: feature number {}", i));
    }
    let config = downstream_config(vec![LibraryReleaseContext::new("storage", "")
        .with_source_roots(["storage"])
        .triggered()]);
    let delivery = OverflowDelivery::new(MemoryGistStore::new(), 256);

    let outcome = run_release_notes(&repo.open(), &config, &delivery, &options())
        .await
        .unwrap();

    assert_eq!(delivery.store().created_count(), 1);
    assert!(outcome.body.len() < 256);
    let full = delivery.resolve(&outcome.body).await.unwrap();
    assert!(full.contains("* feature number 0"));
    assert!(full.contains("* feature number 19"));
    assert!(full.contains("<details><summary>storage: 0.1.0</summary>"));
}

#[tokio::test]
async fn test_generation_body_from_git_history() {
    let mut upstream = TestRepo::new();
    let baseline = upstream.commit(&["google/storage/v2/storage.proto"], "chore: baseline");
    let feature = upstream.commit(
        &["google/storage/v2/storage.proto"],
        "feat: add soft delete policy\n\nAdds the SoftDeletePolicy message.\n\nPiperOrigin-RevId: 712345678",
    );
    upstream.commit(&["google/pubsub/v1/pubsub.proto"], "fix: pubsub only change");

    let mut downstream = TestRepo::new();
    downstream.commit(&["storage/apiv2/client.go"], "chore: initial");
    fs::write(downstream.dir.path().join("storage/apiv2/client.go"), "regenerated").unwrap();

    let config = Config {
        image: "gcr.io/librarian-go:1".to_string(),
        libraries: vec![LibraryReleaseContext::new("storage", "1.0.0")
            .with_source_roots(["storage"])
            .with_api_paths(["google/storage/v2"])
            .with_last_generated_commit(baseline.to_string())],
        ..Config::default()
    };
    let delivery = OverflowDelivery::new(MemoryGistStore::new(), 0);

    let changes = {
        use librarian_release::git::Repository;
        downstream.open().working_changes().unwrap()
    };
    let outcome = run_generation_body(&upstream.open(), &changes, &config, &delivery, &options())
        .await
        .unwrap();

    let short_start = &baseline.to_string()[..7];
    let short_end = &feature.to_string()[..7];
    let expected_start = format!(
        "This pull request is generated with proto changes between\n\
         [googleapis/googleapis@{}](https://github.com/googleapis/googleapis/commit/{})\n\
         (exclusive) and\n\
         [googleapis/googleapis@{}](https://github.com/googleapis/googleapis/commit/{})\n\
         (inclusive).\n",
        short_start, baseline, short_end, feature
    );
    assert!(outcome.body.starts_with(&expected_start), "{}", outcome.body);
    assert!(outcome.body.contains("feat: [storage] add soft delete policy\nAdds the SoftDeletePolicy message.\n"));
    assert!(outcome.body.contains("PiperOrigin-RevId: 712345678"));
    assert!(!outcome.body.contains("pubsub only change"));
    assert!(outcome.body.ends_with("END_NESTED_COMMIT\nEND_COMMIT_OVERRIDE\n"));
    assert_eq!(outcome.commit_counts.get("storage"), Some(&1));
    assert!(outcome.warnings.is_empty());
}

#[tokio::test]
async fn test_generation_body_with_no_new_commits() {
    let mut upstream = TestRepo::new();
    let baseline = upstream.commit(&["google/storage/v2/storage.proto"], "chore: baseline");

    let config = Config {
        libraries: vec![LibraryReleaseContext::new("storage", "1.0.0")
            .with_source_roots(["storage"])
            .with_api_paths(["google/storage/v2"])
            .with_last_generated_commit(baseline.to_string())],
        ..Config::default()
    };
    let delivery = OverflowDelivery::new(MemoryGistStore::new(), 0);

    let outcome = run_generation_body(
        &upstream.open(),
        &["storage/x.go".to_string()],
        &config,
        &delivery,
        &options(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.body, NO_COMMITS_MESSAGE);
}
