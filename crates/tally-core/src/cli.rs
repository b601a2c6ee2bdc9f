use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tally",
    version,
    about = "tally: a local todo-list manager",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "tallyrc")]
    pub tallyrc: Option<PathBuf>,

    #[arg(long = "data")]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create a task. Every field is validated; the date accepts
    /// dd.mm.yyyy or yyyy-mm-dd and is stored canonically.
    Add {
        #[arg(short = 't', long)]
        title: Option<String>,

        #[arg(short = 'd', long)]
        description: Option<String>,

        #[arg(long)]
        date: Option<String>,

        #[arg(short = 'p', long)]
        priority: Option<String>,
    },

    /// Toggle completion on the task whose id starts with the given
    /// prefix.
    Done { id: String },

    /// Filter, sort and print the task list.
    List {
        /// Exclude completed tasks.
        #[arg(long)]
        hide_completed: bool,

        /// Case-insensitive substring match over title and description.
        #[arg(short = 's', long)]
        search: Option<String>,

        /// Inclusive lower date bound (dd.mm.yyyy or yyyy-mm-dd).
        #[arg(long)]
        from: Option<String>,

        /// Inclusive upper date bound.
        #[arg(long)]
        to: Option<String>,

        /// Sort column: completed, title, priority or date.
        #[arg(long)]
        sort: Option<String>,

        #[arg(long, conflicts_with = "descending")]
        ascending: bool,

        #[arg(long)]
        descending: bool,

        /// Print full task ids instead of the table.
        #[arg(long)]
        ids: bool,
    },

    /// Print the month grid (defaults to the current month).
    Calendar {
        /// Month to show, as yyyy-mm.
        month: Option<String>,

        /// Date to mark as selected.
        #[arg(long)]
        selected: Option<String>,
    },
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::IsTerminal::is_terminal(&std::io::stderr()))
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}
