//! CLI argument parsing

use clap::{Args, Parser, Subcommand};

use crate::interface::terminal::StatusFilter;

#[derive(Parser)]
#[command(name = "dockpulse")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the HTTP API and the embedded dashboard (default)
    Serve,

    /// Poll a running server and draw the dashboard in the terminal
    Watch(WatchArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct WatchArgs {
    /// API root to poll [default: DOCKPULSE_API_URL]
    #[arg(long)]
    pub url: Option<String>,

    /// Seconds between polls [default: DOCKPULSE_POLL_INTERVAL]
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// Only list containers in this state
    #[arg(short, long, value_enum, default_value_t = StatusFilter::All)]
    pub status: StatusFilter,

    /// Skip a poll while the previous one is still pending
    #[arg(long)]
    pub skip_overlapping: bool,
}
