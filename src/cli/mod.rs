pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "cytube-feeder")]
#[command(about = "Queue new YouTube uploads into a CyTube channel", long_about = None)]
pub struct Cli {
    /// SQLite database holding the per-channel watermarks
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Channel list of `# Name` lines, each followed by its channel id
    #[arg(long, global = true)]
    pub channels: Option<PathBuf>,

    /// Number of feeds fetched at once
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Seed new channels, queue new uploads, advance watermarks (default)
    Run {
        /// Report what would be queued without connecting or advancing watermarks
        #[arg(long)]
        dry_run: bool,
    },
    /// Only record watermarks for channels that have none yet
    Seed,
    /// Show stored watermarks
    List,
}

impl Cli {
    /// Command-line flags take precedence over the config file.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(ref db) = self.db {
            config.storage.database = Some(db.clone());
        }
        if let Some(ref channels) = self.channels {
            config.storage.channel_list = Some(channels.clone());
        }
        if let Some(workers) = self.workers {
            config.feeds.workers = workers;
        }
    }

    pub fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Run { dry_run: false })
    }
}
