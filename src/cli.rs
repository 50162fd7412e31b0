use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "vcinventory",
    version,
    about = "Classify vCenter VMs by folder naming convention and report fleet inventory"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Derive folder prefix and environment from one or more folder paths
    Classify {
        /// Slash-delimited folder paths, outermost folder first
        #[arg(required_unless_present = "stdin")]
        paths: Vec<String>,

        /// Read newline-delimited paths from stdin
        #[arg(long, conflicts_with = "paths")]
        stdin: bool,

        /// Print results as a JSON array
        #[arg(long)]
        json: bool,

        /// Segment used when no folder carries an underscore (outermost, skip-root)
        #[arg(long)]
        fallback: Option<String>,
    },

    /// Classify every VM of the configured vCenters and summarize by prefix and environment
    Inventory {
        /// Fleet config file (default: ./vcinventory.toml, then the user config directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the full report as JSON to this path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only scan these vCenters (repeatable)
        #[arg(long = "vcenter")]
        vcenters: Vec<String>,

        /// Override the config's fallback scope (outermost, skip-root)
        #[arg(long)]
        fallback: Option<String>,

        /// Also print one line per VM
        #[arg(long)]
        rows: bool,

        /// Show detailed progress output
        #[arg(short, long)]
        verbose: bool,
    },

    /// List environment keywords in matching order
    Keywords,
}
