//! # certi CLI entry point
//!
//! Parses arguments, installs the tracing subscriber, opens the selected
//! backend, and dispatches to the subcommand handler.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use certi_cli::backend::{self, Backend};
use certi_cli::commands::{self, Command, Output};
use certi_cli::config::await_policy_from_env;
use certi_core::Identity;

/// CertiChain: a role-gated credential registry.
///
/// Users register documents against their identity, issuers verify them,
/// and anyone can look up a portfolio.
#[derive(Parser, Debug)]
#[command(name = "certi", version, about, long_about = None)]
struct Cli {
    /// Identity acting in this invocation.
    #[arg(long, global = true, env = "CERTI_CALLER")]
    caller: Option<Identity>,

    /// Registry and blob store backend.
    #[arg(long, global = true, value_enum, env = "CERTI_BACKEND", default_value = "local")]
    backend: Backend,

    /// State directory of the local backend.
    #[arg(long, global = true, env = "CERTI_STATE_DIR", default_value = ".certi")]
    state_dir: PathBuf,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Command::Genesis { owner, force } = &cli.command {
        if cli.backend != Backend::Local {
            anyhow::bail!("genesis only applies to the local backend");
        }
        let path = backend::genesis(&cli.state_dir, owner.clone(), *force)?;
        println!("created registry owned by {owner} at {}", path.display());
        return Ok(());
    }

    let session = backend::open(cli.backend, &cli.state_dir, await_policy_from_env())?;
    let caller = cli.caller.or_else(|| session.default_caller.clone());
    let output = if cli.json { Output::Json } else { Output::Text };
    let mutates = cli.command.mutates();

    let result = commands::run(cli.command, &session.flows, caller.as_ref(), output).await;
    // Persist even on failure: an abandoned or orphaned step may still have queued state.
    if mutates {
        session.persist()?;
    }
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);
    tracing::debug!(backend = ?cli.backend, "certi starting");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
