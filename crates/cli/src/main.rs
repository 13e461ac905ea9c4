//! StarWatch CLI entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse configuration**: load `starwatch.toml` (or `--config` /
//!    `STARWATCH_CONFIG`) and validate it before any request is made.
//! 2. **Wire observability**: configure `tracing-subscriber` with a text or
//!    JSON layer and, when configured, an OpenTelemetry OTLP exporter. All
//!    `tracing` spans and structured events emitted by every crate in the
//!    workspace flow through this layer.
//! 3. **Construct infrastructure**: create the concrete `GithubClient`,
//!    `JsonFileCursorStore`, and digest sink, and inject them into `Runner`.
//! 4. **Dispatch the subcommand**:
//!    - `run`: one tracking run; pages are mailed, or written to
//!      `--output-dir` as `digest-NNN.html`.
//!    - `list`: print the sorted starred repositories.
//!    - `cursors`: print the stored cursors, one repository per line.

mod config;
mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use github::GithubClient;
use mailer::{DigestRenderer, DirectorySink, SmtpSink};
use runner::Runner;
use state::JsonFileCursorStore;
use tracker::{lister, CursorPersistence, DigestSink, RunId};

use crate::config::{Config, TOKEN_ENV};
use crate::telemetry::LogFormat;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "starwatch",
    version,
    about = "Mail a digest of new releases from your GitHub stars"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(
        short,
        long,
        env = "STARWATCH_CONFIG",
        default_value = "starwatch.toml",
        global = true
    )]
    config: PathBuf,

    /// Console log encoding.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run once: find new releases, deliver the digest, advance cursors.
    Run {
        /// Write digest pages into this directory instead of mailing them.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Print the starred repositories in processing order.
    List,
    /// Print the stored release cursors, one repository per line.
    Cursors,
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn run(config: &Config, output_dir: Option<PathBuf>, env_token: Option<&str>) -> Result<()> {
    config.validate(output_dir.is_none(), env_token)?;

    let github = Arc::new(
        GithubClient::new(config.github_settings(env_token)?)
            .context("failed to build GitHub client")?,
    );
    let rate_limit = github.rate_limit().clone();
    let persistence = Arc::new(JsonFileCursorStore::new(&config.state.cursor_path));

    let renderer = DigestRenderer::new(config.digest.subject.clone())?;
    let sink: Arc<dyn DigestSink> = match output_dir {
        Some(dir) => {
            info!(directory = %dir.display(), "writing digest pages to disk");
            Arc::new(DirectorySink::new(dir, renderer))
        }
        None => Arc::new(SmtpSink::new(config.smtp_settings()?, renderer)?),
    };

    let runner = Runner::new(
        github.clone(),
        github,
        persistence,
        sink,
        config.run_settings()?,
    );

    let summary = runner.run(RunId::new_random()).await?;

    info!(
        repositories = summary.repositories,
        new_releases = summary.new_releases,
        advanced_cursors = summary.advanced_cursors,
        pages = summary.pages,
        cursors_saved = summary.cursors_saved,
        rate_limit_remaining = rate_limit.remaining(),
        rate_limit_reset_at = rate_limit.reset_at(),
        "run finished"
    );
    if !summary.failed_repositories.is_empty() {
        warn!(
            count = summary.failed_repositories.len(),
            repositories = ?summary.failed_repositories,
            "some release feeds could not be read; they will be retried next run"
        );
    }
    if !summary.failed_pages.is_empty() {
        warn!(pages = ?summary.failed_pages, "some digest pages were not delivered");
    }
    Ok(())
}

async fn list(config: &Config, env_token: Option<&str>) -> Result<()> {
    let user = config.user()?;
    let github = GithubClient::new(config.github_settings(env_token)?)
        .context("failed to build GitHub client")?;

    let repositories = lister::list_starred(&github, &user).await?;
    for repository in &repositories {
        println!(
            "{}\t{}\t{}",
            repository.full_name, repository.stargazers_count, repository.html_url
        );
    }
    info!(count = repositories.len(), %user, "listed starred repositories");
    Ok(())
}

async fn cursors(config: &Config) -> Result<()> {
    let store = JsonFileCursorStore::new(&config.state.cursor_path);
    let cursors = store
        .read()
        .await
        .with_context(|| format!("failed to read {}", store.path().display()))?;
    for (repository, guid) in cursors.iter() {
        println!("{repository}\t{guid}");
    }
    info!(count = cursors.len(), "listed release cursors");
    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // ---- CLI ----
    let cli = Cli::parse();

    // ---- Config ----
    let config = config::load_config(&cli.config)?;
    let env_token = std::env::var(TOKEN_ENV).ok();

    // ---- Tracing ----
    let telemetry = telemetry::init(cli.log_format, config.telemetry.otlp_endpoint.as_deref())?;
    info!(config_path = %cli.config.display(), "starting starwatch");

    let outcome = match cli.command {
        Command::Run { output_dir } => run(&config, output_dir, env_token.as_deref()).await,
        Command::List => list(&config, env_token.as_deref()).await,
        Command::Cursors => cursors(&config).await,
    };

    if let Err(ref e) = outcome {
        let message = format!("{e:#}");
        error!(error = %message, "starwatch failed");
    }

    telemetry.shutdown();
    outcome
}
