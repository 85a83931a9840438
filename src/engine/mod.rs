//! The configuration reconciliation engine.
//!
//! Takes a previously captured reference chassis and selectively applies
//! it to a live target: the identity map translates switch identifiers,
//! state capture mirrors the target, the diff evaluator computes minimal
//! attribute changes, and the pipeline runner drives the declarative
//! action table with checkpointed re-captures, scope-level failure
//! isolation, and a final outcome report.

mod action;
mod actions;
mod capture;
mod diff;
mod identity;
mod pipeline;
mod report;
#[cfg(test)]
mod testutil;

pub use action::{ACTION_TABLE, ActionDescriptor, ActionKind, Category};
pub use actions::{DEFAULT_USER_PASSWORD, zone_db_differs};
pub use capture::{CapturePlan, capture};
pub use diff::{ChangeSet, MembershipDelta, diff_attributes, diff_membership};
pub use identity::{Diagnostic, IdentityEntry, IdentityMap, MappingRule};
pub use pipeline::{CancelFlag, Pipeline, PipelineConfig};
pub use report::{OutcomeRecord, RecordSet, Report, RunStatus, ScopeKey, ScopeSummary};
