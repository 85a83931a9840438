//! CLI module for the restore tool.
//!
//! This module provides the command-line interface for restoring,
//! scanning, and validating against a chassis snapshot.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::OutputFormatter;
