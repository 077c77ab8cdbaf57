//! CLI definition using clap.

use clap::Parser;
use std::path::PathBuf;

/// digestr - collect host signals, summarize them, send the digest to chat
#[derive(Parser, Debug)]
#[command(name = "digestr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose output (debug logging)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}
