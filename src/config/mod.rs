//! Configuration module for the restore tool.
//!
//! This module handles the run configuration:
//! - Parsing and deserializing the YAML plan file
//! - The compact FID-map string format
//! - Resolving credentials from the environment

mod parser;
mod spec;

pub use parser::{ConfigParser, parse_fid_map};
pub use spec::{RestorePlan, TargetConfig};
