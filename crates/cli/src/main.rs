//! compvc command-line tool.
//!
//! The CLI is a thin layer over `compvc-core`: it parses flags, expands
//! wildcard component ids, normalizes the flag set into a target
//! directive and a merge strategy, runs the checkout orchestrator, and
//! renders the result report.

mod expand;
mod interactive;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use compvc_core::checkout::CheckoutOrchestrator;
use compvc_core::component::{CheckoutOptions, MergeStrategy, TargetDirective, Version};
use compvc_core::errors::ConfigError;
use compvc_core::store::FsStore;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Component-based version checkout tool.
#[derive(Parser, Debug)]
#[command(
    name = "compvc",
    version,
    about = "Switch between component versions or remove local changes"
)]
struct Cli {
    /// Path to the component store root.
    #[arg(short, long, global = true, default_value = ".compvc")]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Switch component versions or remove local changes.
    ///
    /// `compvc checkout <version> [ids...]` switches the given ids (or
    /// all components with --all) to the specified version;
    /// `compvc checkout latest [ids...]` switches to each component's
    /// latest version; `compvc checkout [ids...] --reset` removes local
    /// modifications. Ids may use wildcards (e.g. "utils/*").
    Checkout {
        /// Version (or the literal `latest`) followed by component ids.
        /// With --reset, all values are component ids.
        values: Vec<String>,

        /// When the merge finds conflicts, prompt per file for a resolution.
        #[arg(short = 'i', long)]
        interactive_merge: bool,

        /// On conflict, keep the local modification.
        #[arg(short = 'o', long)]
        ours: bool,

        /// On conflict, take the target version.
        #[arg(short = 't', long)]
        theirs: bool,

        /// On conflict, leave the files with conflict markers to resolve later.
        #[arg(short = 'm', long)]
        manual: bool,

        /// Remove local changes (restore the base snapshot).
        #[arg(short = 'r', long)]
        reset: bool,

        /// Apply to all tracked components.
        #[arg(short = 'a', long)]
        all: bool,

        /// Show per-file outcome detail.
        #[arg(short = 'v', long)]
        verbose: bool,

        /// Do not install packages of the checked-out components.
        #[arg(long)]
        skip_dependency_install: bool,

        /// Do not write dist files.
        #[arg(long)]
        skip_dist: bool,

        /// Print the result as JSON instead of a report.
        #[arg(long)]
        json: bool,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Checkout {
            values,
            interactive_merge,
            ours,
            theirs,
            manual,
            reset,
            all,
            verbose,
            skip_dependency_install,
            skip_dist,
            json,
        } => {
            let strategy = MergeStrategy::from_flags(interactive_merge, ours, theirs, manual)
                .context("invalid flag combination")?;
            let (directive, raw_ids) = normalize_values(values, reset)?;

            let store = Arc::new(FsStore::new(&cli.store));
            let ids = expand::expand_ids(store.as_ref(), &raw_ids, all)?;
            tracing::debug!(count = ids.len(), "expanded component ids");

            let options = CheckoutOptions {
                verbose,
                skip_dependency_install,
                skip_dist_write: skip_dist,
            };
            let mut orchestrator = CheckoutOrchestrator::new(store, strategy, options);
            if strategy == MergeStrategy::ManualInteractive {
                orchestrator = orchestrator.with_prompt(Arc::new(interactive::TerminalPrompt));
            }

            // Ctrl-C cancels the batch: finished components stay applied,
            // unstarted ones report a cancellation failure.
            let cancel = orchestrator.cancel_handle();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.store(true, Ordering::SeqCst);
                }
            });

            let results = orchestrator.checkout_many(&ids, &directive).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                print!("{}", report::render(&results, &directive, verbose));
            }

            Ok(if results.has_failures() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
    }
}

/// Split the positional values into a target directive and raw ids.
///
/// Without `--reset` the first value names the target version (or the
/// literal `latest`); with `--reset` every value is an id and a version
/// token is a configuration error.
fn normalize_values(values: Vec<String>, reset: bool) -> Result<(TargetDirective, Vec<String>)> {
    if reset {
        if let Some(first) = values.first() {
            // Ids always contain a scope separator; a bare token here is
            // someone combining --reset with a version.
            if !first.contains('/') && !first.contains('*') {
                return Err(ConfigError::ResetWithVersion.into());
            }
        }
        return Ok((TargetDirective::Reset, values));
    }

    let Some((first, rest)) = values.split_first() else {
        bail!("specify a version (or 'latest') followed by component ids");
    };
    if first.contains('/') {
        bail!(
            "'{}' looks like a component id; the first value must be a version or 'latest'",
            first
        );
    }
    let directive = if first == "latest" {
        TargetDirective::Latest
    } else {
        TargetDirective::Explicit(Version::new(first.clone()))
    };
    Ok((directive, rest.to_vec()))
}
