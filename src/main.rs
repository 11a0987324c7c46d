use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use covstore::config::{StoreConfig, DEFAULT_DB_PATH};
use covstore::ingest::Target;
use covstore::model::ReportQuery;
use covstore::{cli, ReportStore};

/// covstore — store CI coverage reports, merge uploads per commit, and track
/// branches.
#[derive(Parser)]
#[command(name = "covstore", version, about)]
struct Cli {
    /// Path to the SQLite database.
    #[arg(long, global = true, env = "COVSTORE_DB", default_value = DEFAULT_DB_PATH)]
    db: PathBuf,

    /// Milliseconds to wait on another writer's lock before failing.
    #[arg(long, global = true, env = "COVSTORE_BUSY_TIMEOUT_MS", default_value_t = 5000)]
    busy_timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a parsed coverage payload (JSON) for a commit.
    Upload {
        /// Path to the coverage payload.
        file: PathBuf,

        /// Report group id.
        #[arg(long, env = "REPORT_ID")]
        report: String,

        /// Commit SHA the coverage was produced from.
        #[arg(long)]
        commit: String,

        /// Override the payload's coverage type.
        #[arg(long = "type")]
        report_type: Option<String>,

        /// Branch or tag to attach the report to. Defaults to the CI
        /// branch variables (GITHUB_HEAD_REF, DRONE_SOURCE_BRANCH).
        #[arg(long)]
        branch: Option<String>,

        /// JSON array of repository file paths at this commit.
        #[arg(long)]
        files: Option<PathBuf>,
    },

    /// Show a single report. Without --commit or --branch, shows the latest.
    Show {
        #[arg(long, env = "REPORT_ID")]
        report: String,

        #[arg(long)]
        commit: Option<String>,

        #[arg(long)]
        branch: Option<String>,
    },

    /// List every report matching the filter.
    History {
        #[arg(long, env = "REPORT_ID")]
        report: String,

        #[arg(long)]
        commit: Option<String>,

        #[arg(long)]
        branch: Option<String>,
    },

    /// Show the report(s) for a commit or branch name.
    List {
        #[arg(long, env = "REPORT_ID")]
        report: String,

        /// Commit SHA or branch/tag name.
        selector: String,
    },

    /// Record the pull-request comment id for a report group.
    Comment {
        #[arg(long, env = "REPORT_ID")]
        report: String,

        /// Pull request number.
        #[arg(long, env = "PULL_REQUEST")]
        number: i64,

        /// Comment id on the SCM side.
        comment: i64,
    },

    /// Show the comment recorded for a pull request.
    ShowComment {
        #[arg(long, env = "REPORT_ID")]
        report: String,

        #[arg(long, env = "PULL_REQUEST")]
        number: i64,
    },
}

fn query(report: String, commit: Option<String>, branch: Option<String>) -> ReportQuery {
    ReportQuery {
        group_id: report,
        commit: commit.unwrap_or_default(),
        reference: branch.unwrap_or_default(),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = StoreConfig::new(&cli.db)
        .with_busy_timeout(Duration::from_millis(cli.busy_timeout_ms));
    let mut store = ReportStore::open(&config).context("Failed to open database")?;

    let output = match cli.command {
        Commands::Upload {
            file,
            report,
            commit,
            report_type,
            branch,
            files,
        } => {
            let branch = cli::resolve_branch(branch, |name| std::env::var(name).ok());
            let target = Target {
                group_id: &report,
                commit: &commit,
                reference: branch.as_deref(),
            };
            cli::cmd_upload(
                &mut store,
                &target,
                &file,
                report_type.as_deref(),
                files.as_deref(),
            )?
        }
        Commands::Show {
            report,
            commit,
            branch,
        } => cli::cmd_show(&store, &query(report, commit, branch))?,
        Commands::History {
            report,
            commit,
            branch,
        } => cli::cmd_history(&store, &query(report, commit, branch))?,
        Commands::List { report, selector } => cli::cmd_list(&store, &report, &selector)?,
        Commands::Comment {
            report,
            number,
            comment,
        } => cli::cmd_comment(&mut store, &report, number, comment)?,
        Commands::ShowComment { report, number } => {
            cli::cmd_show_comment(&store, &report, number)?
        }
    };

    print!("{output}");
    Ok(())
}
