mod config;
mod report;
mod source;
mod store;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{CommandFactory as _, Parser, Subcommand};

use ledgersync::model::RunContext;
use ledgersync::{normalize, reconcile, staleness};

use crate::config::Config;
use crate::source::{Connector, FetchWindow};
use crate::store::LedgerStore;

#[derive(Parser)]
#[command(
    name = "ledgersync",
    about = "Reconcile SimpleFIN account data into an append-oriented CSV ledger"
)]
#[command(disable_help_subcommand = true)]
struct Args {
    /// Config file path. Defaults to ledgersync.toml in the working directory.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, reconcile and write the ledger (default)
    Sync,
    /// Fetch and reconcile, show what would be added, write nothing
    Preview,
}

pub fn run(args: impl IntoIterator<Item = String>) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ledgersync=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    clap_complete::CompleteEnv::with_factory(Args::command).complete();

    let args = Args::parse_from(args);
    let (base_dir, config) = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::find_and_load()?
            .context("no ledgersync.toml found in the working directory")?,
    };

    let command = args.command.unwrap_or(Commands::Sync);
    match command {
        Commands::Sync => sync(&base_dir, &config, true),
        Commands::Preview => sync(&base_dir, &config, false),
    }
}

fn sync(base_dir: &std::path::Path, config: &Config, write: bool) -> Result<()> {
    let ctx = RunContext {
        now: Local::now().naive_local(),
        threshold_days: config.stale_after_days,
        corrections: config.corrections.clone(),
    };

    let connector = Connector::from_access_url(&config.access_url)?;
    let raw_accounts = connector.fetch_accounts(FetchWindow::around(ctx.now.date()))?;
    let batch = normalize::normalize(raw_accounts, &ctx);

    let store = LedgerStore::new(base_dir.join(&config.data_dir));
    let ledger = store.read_ledger()?;
    let outcome = reconcile::reconcile(&ledger, batch.transactions);
    let stale = staleness::stale_accounts(&batch.snapshots, ctx.threshold_days);

    if write {
        // Nothing novel means the ledger write can be skipped entirely; the
        // history and highlight sidecar are still updated every run.
        if !outcome.is_unchanged() {
            store.write_ledger(&outcome.ledger)?;
        }
        store.write_highlights(ctx.now, &outcome.added)?;
        store.append_history(&batch.snapshots)?;
    }

    report::print_summary(&outcome, &stale, &batch.malformed, write);
    Ok(())
}
