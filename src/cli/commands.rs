//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - run: interactive dispatcher reading commands from stdin
//! - demo: scripted play/pause/stop scenario

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Mainloop - drive a ticking control loop with play/pause/stop/quit
#[derive(Parser, Debug)]
#[command(name = "mainloop")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Read play/pause/stop/quit/status commands from stdin
    Run,

    /// Run a scripted scenario: play, pause, resume, stop
    Demo {
        /// Total scenario length in seconds (overrides config)
        #[arg(short, long)]
        seconds: Option<u64>,

        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },
}
