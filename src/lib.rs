// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Fabric Restore
//!
//! A declarative, idempotent restore engine for Fibre Channel SAN chassis
//! configurations.
//!
//! ## Overview
//!
//! Fabric Restore replays a previously captured chassis snapshot onto a
//! live target chassis through its management REST API, allowing you to:
//!
//! - Rebuild a chassis after a service action or hardware replacement
//! - Use one chassis as a template for many (MAPS policies, zoning)
//! - Selectively restore categories of configuration (`-p maps`)
//! - Re-run safely: a converged target receives zero writes
//!
//! ## Architecture
//!
//! The system is built around **reference-driven reconciliation**:
//!
//! 1. **Reference Inventory**: the immutable snapshot being replayed
//! 2. **Target State**: re-captured from the live device at checkpoints
//! 3. **Pipeline**: a declarative action table diffing and writing only
//!    what differs, isolating failures per chassis or logical switch
//!
//! ## Modules
//!
//! - [`config`]: Plan-file parsing and the FID-map format
//! - [`model`]: Chassis, switch, port, and zone-database attribute bags
//! - [`fos`]: Management API transport and HTTP client
//! - [`engine`]: Identity map, capture, diff, action pipeline, report
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! target:
//!   host: https://10.1.1.1
//!   username: admin
//! snapshot: capture.json
//! restore: [vfs, vfp, s, p, z]
//! fid_map: "1;20,3,,23,switch_23"
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod fos;
pub mod model;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigParser, RestorePlan, TargetConfig};
pub use engine::{
    CancelFlag, Category, IdentityMap, MappingRule, Pipeline, PipelineConfig, Report, RunStatus,
};
pub use error::{RestoreError, Result};
pub use fos::{FosClient, Method, Transport};
pub use model::{ChassisRecord, ReferenceInventory, SwitchRecord, TargetState, ZoneDb};
