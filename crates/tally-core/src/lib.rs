pub mod calendar;
pub mod cli;
pub mod commands;
pub mod config;
pub mod date;
pub mod filter;
pub mod render;
pub mod sort;
pub mod store;
pub mod task;
pub mod validate;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::GlobalCli::parse_from(raw_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(verbose = cli.verbose, quiet = cli.quiet, "starting tally");

    let mut cfg = config::Config::load(cli.tallyrc.as_deref())?;
    cfg.apply_overrides(cli.rc_overrides.into_iter().map(|kv| (kv.key, kv.value)));

    let data_dir = config::resolve_data_dir(&cfg, cli.data.as_deref())
        .context("failed to resolve data directory")?;
    debug!(data_dir = %data_dir.display(), "resolved data directory");

    let storage = store::JsonFileStorage::open(&data_dir).with_context(|| {
        format!("failed to open task storage at {}", data_dir.display())
    })?;
    let mut task_store =
        store::TaskStore::open(Box::new(storage)).context("failed to load tasks")?;

    let mut renderer = render::Renderer::new(&cfg)?;
    let command = cli.command.unwrap_or_else(commands::default_command);

    commands::dispatch(&mut task_store, &cfg, &mut renderer, command)?;

    info!("done");
    Ok(())
}
