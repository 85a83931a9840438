//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Declarative restore engine for SAN chassis configurations.
#[derive(Parser, Debug)]
#[command(name = "fabric-restore")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the plan file.
    #[arg(short = 'f', long, global = true, env = "FABRIC_RESTORE_PLAN")]
    pub plan: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with tables.
    Text,
    /// Machine-readable JSON.
    Json,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Restore a chassis from a snapshot.
    Restore {
        /// Base URL of the target device, e.g. https://10.1.1.1.
        #[arg(long)]
        host: Option<String>,

        /// Login user ID for the target device.
        #[arg(long)]
        username: Option<String>,

        /// Snapshot file to restore from.
        #[arg(short = 'i', long)]
        snapshot: Option<PathBuf>,

        /// WWN of the chassis within the snapshot.
        #[arg(long)]
        wwn: Option<String>,

        /// Restore categories as a CSV of tokens, or * for all.
        #[arg(short = 'p', long)]
        restore: Option<String>,

        /// Compact FID-map string.
        #[arg(long)]
        fid_map: Option<String>,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// List the chassis and logical switches on both sides.
    Scan {
        /// Base URL of the target device.
        #[arg(long)]
        host: Option<String>,

        /// Login user ID for the target device.
        #[arg(long)]
        username: Option<String>,

        /// Snapshot file to scan.
        #[arg(short = 'i', long)]
        snapshot: Option<PathBuf>,
    },

    /// Validate the plan file without touching any device.
    Validate,
}
