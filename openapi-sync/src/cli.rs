///
/// This module implements the CLI interface for openapi-sync: command parsing,
/// wiring of the concrete collaborators, and the async entrypoint.
///
/// All pipeline logic (fetching, change detection, transformation, orchestration)
/// lives in the [`openapi-sync-core`] crate. This module is strictly glue.
///
/// ## How To Use
/// - For scheduled runs: invoke the `openapi-sync sync` binary (exit code 0 on
///   success or no change, 1 on any failure).
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`openapi-sync-core`]: ../../openapi-sync-core/
use crate::git::GitRepository;
use crate::load_config::{load_config, Overrides};
use anyhow::Result;
use clap::{Parser, Subcommand};
use openapi_sync_core::fetch::HttpFetcher;
use openapi_sync_core::synchronise::{synchronise, SyncOutcome};
use std::path::PathBuf;

/// CLI for openapi-sync: mirror an upstream OpenAPI document and publish its transformed variant.
#[derive(Parser)]
#[clap(
    name = "openapi-sync",
    version,
    about = "Keep a git-tracked copy of a remote OpenAPI document in sync and publish a transformed variant"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the document, and commit and push it (raw and transformed) if it changed
    Sync {
        /// Path to an optional YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
        /// Document location; overrides OPENAPI_SPEC_URL and the config file
        #[clap(long)]
        url: Option<String>,
        /// Git working tree the artifacts are written to
        #[clap(long)]
        working_dir: Option<PathBuf>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<SyncOutcome> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Sync {
            config,
            url,
            working_dir,
        } => {
            tracing::info!(command = "sync", "=== OpenAPI Specification Update ===");
            let config = load_config(config.as_deref(), Overrides { url, working_dir })?;

            let fetcher = HttpFetcher::new(config.timeout)?;
            let repo = GitRepository::new(&config.working_dir)?;

            match synchronise(&config, &fetcher, &repo, &repo).await {
                Ok(outcome) => {
                    tracing::info!(command = "sync", ?outcome, "Synchronisation complete");
                    Ok(outcome)
                }
                Err(e) => {
                    tracing::error!(command = "sync", stage = %e.stage, error = %e, "Synchronisation failed");
                    Err(anyhow::Error::new(e))
                }
            }
        }
    }
}
