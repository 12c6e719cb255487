use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ytm4a_core::DEFAULT_FOLDER;

#[derive(Debug, Parser)]
#[command(name = "ytm4a", version, about = "Queue YouTube videos and hand them to the processing server")]
pub struct Cli {
    /// RON configuration file.
    #[arg(long, env = "YTM4A_CONFIG", default_value = "ytm4a.ron")]
    pub config: PathBuf,

    /// JSON file holding the queue (overrides the configuration file).
    #[arg(long, env = "YTM4A_STORE")]
    pub store: Option<PathBuf>,

    /// Processing endpoint (overrides the configuration file).
    #[arg(long, env = "YTM4A_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Answer yes to every confirmation.
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Log debug output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Add a video page to the queue.
    Add {
        url: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = DEFAULT_FOLDER)]
        folder: String,
        /// Ticker symbol, required for the Economics folder.
        #[arg(long)]
        ticker: Option<String>,
    },
    /// Send every pending or failed item to the processing server, one at a time.
    Process,
    /// Reload the queue and fail items stuck in processing.
    Refresh,
    /// Remove one item.
    Remove { id: String },
    /// Remove every item.
    Clear,
    /// Show the queue.
    List,
    /// Show one item in detail.
    Show { id: String },
}
