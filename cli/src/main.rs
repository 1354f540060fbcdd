//! shelfmark: inventory ledger CLI
//!
//! Products, categories and sales with a tamper-evident audit chain, stored
//! in a local JSON snapshot.
//!
//! Usage:
//!   shelfmark category add Electronics --id electronics --attr voltage:number:required
//!   shelfmark import products.csv --category electronics
//!   shelfmark sale 3f2a...:2 91bc...:1
//!   shelfmark audit verify --strict

mod commands;
mod config;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use shelfmark_contracts::error::LedgerResult;
use shelfmark_service::Ledger;
use shelfmark_store::MemoryStore;

use crate::commands::Command;
use crate::config::CliConfig;

// ── CLI definition ────────────────────────────────────────────────────────────

/// shelfmark: inventory ledger with a hash-chained audit log.
///
/// Every command prints its result as JSON. Errors go to stderr and the
/// process exits with status 1.
#[derive(Parser)]
#[command(name = "shelfmark", version, about = "Inventory ledger with a tamper-evident audit log")]
struct Cli {
    /// Config file (default: ./shelfmark.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Store snapshot file; overrides `data_file`.
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,
    /// Actor recorded on audit entries; overrides `actor`.
    #[arg(long, global = true)]
    actor: Option<String>,
    #[command(subcommand)]
    command: Command,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    let config = match CliConfig::load(cli.config.as_deref()) {
        Ok(config) => config.with_overrides(cli.data_file, cli.actor),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    // RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    if let Err(e) = run(&config, cli.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(config: &CliConfig, command: Command) -> LedgerResult<()> {
    let store = MemoryStore::open(&config.data_file)?;
    debug!(data_file = %config.data_file.display(), actor = %config.actor, "store opened");

    let ledger = Ledger::new(Arc::new(store), config.actor.clone());
    commands::run(&ledger, command, config.page_size)
}
