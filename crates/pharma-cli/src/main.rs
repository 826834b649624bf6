//! # pharmachain CLI entry point
//!
//! Parses arguments, installs the tracing subscriber, restores the ledger
//! snapshot, and dispatches to the audit and registry handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pharma_cli::audit::{run_history, run_status, run_trace, run_verify, BatchArgs, StatusArgs, VerifyArgs};
use pharma_cli::registry::{run_actors, run_role, ActorsArgs, RoleArgs};
use pharma_cli::ChainSource;

/// PharmaChain audit tool
///
/// Verifies and inspects a persisted batch ledger. Loading a snapshot
/// replays every batch history; a tampered snapshot is rejected before any
/// subcommand runs.
#[derive(Parser, Debug)]
#[command(name = "pharmachain", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML chain configuration.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the ledger snapshot (overrides `snapshot_path` in the config).
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay histories and check them against stored projections.
    Verify(VerifyArgs),

    /// Show the ordered custodians of a batch.
    Trace(BatchArgs),

    /// Show every transition record of a batch.
    History(BatchArgs),

    /// Show the current state of one batch or all batches.
    Status(StatusArgs),

    /// Resolve an actor's role.
    Role(RoleArgs),

    /// List registered actors.
    Actors(ActorsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let source = ChainSource {
        config: cli.config,
        snapshot: cli.snapshot,
    };
    let result = source.open().and_then(|chain| {
        let mut out = std::io::stdout().lock();
        match &cli.command {
            Commands::Verify(args) => run_verify(args, &chain, cli.json, &mut out),
            Commands::Trace(args) => run_trace(args, &chain, cli.json, &mut out),
            Commands::History(args) => run_history(args, &chain, cli.json, &mut out),
            Commands::Status(args) => run_status(args, &chain, cli.json, &mut out),
            Commands::Role(args) => run_role(args, &chain, cli.json, &mut out),
            Commands::Actors(args) => run_actors(args, &chain, cli.json, &mut out),
        }
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
