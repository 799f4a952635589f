use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};

use librarian_release::cli::orchestration::{self, WorkflowOptions};
use librarian_release::config::{self, Config};
use librarian_release::git::{Git2Repository, Repository};
use librarian_release::overflow::{GistStore, GitHubGistStore, MemoryGistStore, OverflowDelivery};
use librarian_release::ui;

#[derive(Parser)]
#[command(
    name = "librarian-release",
    version,
    about = "Derive library versions and render release and generation pull-request bodies"
)]
struct Args {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(
        long,
        global = true,
        help = "Never create gists; fail when a body exceeds the inline limit"
    )]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render release notes and next versions for release-triggered libraries
    ReleaseNotes {
        #[arg(long, default_value = ".", help = "Language repository to read history from")]
        repo: PathBuf,

        #[arg(long, help = "Release date (YYYY-MM-DD), defaults to today")]
        date: Option<NaiveDate>,
    },

    /// Render the commit-override body for a generation pull request
    GenerateBody {
        #[arg(long, help = "Clone of the upstream interface-definition repository")]
        upstream: PathBuf,

        #[arg(
            long,
            default_value = ".",
            help = "Language repository whose working tree holds the generated output"
        )]
        downstream: PathBuf,
    },

    /// Print the full text behind an overflow reference
    Resolve {
        #[arg(help = "File holding the pull-request body; reads stdin when absent")]
        input: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Write to stderr so logs don't interfere with the body printed on stdout
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        ui::display_error(&e.to_string());
        for cause in e.chain().skip(1) {
            eprintln!("  Caused by: {cause}");
        }
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = config::load_config(args.config.as_deref()).context("Error loading config")?;

    if args.offline {
        execute(args.command, &config, MemoryGistStore::offline()).await
    } else {
        let store = GitHubGistStore::from_env(config.overflow.api_url.clone())?;
        execute(args.command, &config, store).await
    }
}

async fn execute<S: GistStore>(command: Command, config: &Config, store: S) -> Result<()> {
    let delivery = OverflowDelivery::new(store, config.overflow.max_content_size);
    let tool_version = format!("v{}", env!("CARGO_PKG_VERSION"));

    match command {
        Command::ReleaseNotes { repo, date } => {
            let repo = Git2Repository::open(&repo)
                .with_context(|| format!("Cannot open repository at {}", repo.display()))?;
            let options = WorkflowOptions {
                tool_version,
                date: date.unwrap_or_else(|| Utc::now().date_naive()),
            };

            ui::display_status("Collecting release commits...");
            let outcome =
                orchestration::run_release_notes(&repo, config, &delivery, &options).await?;

            for warning in &outcome.warnings {
                ui::display_boundary_warning(warning);
            }
            let changes: Vec<(String, String, String)> = outcome
                .releases
                .iter()
                .map(|r| {
                    (
                        r.library_id.clone(),
                        r.current_version.clone(),
                        r.next_version.clone(),
                    )
                })
                .collect();
            ui::display_version_changes(&changes);
            ui::display_body(&outcome.body);

            report_failures(&outcome.failures)
        }
        Command::GenerateBody {
            upstream,
            downstream,
        } => {
            let upstream_repo = Git2Repository::open(&upstream)
                .with_context(|| format!("Cannot open repository at {}", upstream.display()))?;
            let downstream_repo = Git2Repository::open(&downstream)
                .with_context(|| format!("Cannot open repository at {}", downstream.display()))?;
            let changes = downstream_repo.working_changes()?;
            let options = WorkflowOptions {
                tool_version,
                date: Utc::now().date_naive(),
            };

            ui::display_status("Collecting upstream commits...");
            let outcome = orchestration::run_generation_body(
                &upstream_repo,
                &changes,
                config,
                &delivery,
                &options,
            )
            .await?;

            for warning in &outcome.warnings {
                ui::display_boundary_warning(warning);
            }
            for (library, count) in &outcome.commit_counts {
                ui::display_success(&format!("{}: {} commit(s)", library, count));
            }
            ui::display_body(&outcome.body);

            report_failures(&outcome.failures)
        }
        Command::Resolve { input } => {
            let text = match input {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Cannot read {}", path.display()))?,
                None => std::io::read_to_string(std::io::stdin())?,
            };
            let resolved = delivery.resolve(text.trim_end_matches('\n')).await?;
            ui::display_body(&resolved);
            Ok(())
        }
    }
}

fn report_failures(failures: &[librarian_release::LibrarianError]) -> Result<()> {
    for failure in failures {
        ui::display_error(&failure.to_string());
    }
    if failures.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("{} library(ies) failed", failures.len())
    }
}
