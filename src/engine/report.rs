//! Outcome records and the final report.
//!
//! Failure isolation is tracked at scope granularity: one record for the
//! chassis and one per affected logical switch. Records are created
//! lazily the first time an action touches a scope and never removed;
//! the report is a pure aggregation rendered once at the end of the run,
//! whatever the run's fate.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Scope identity: the chassis, or one logical switch by fabric ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScopeKey {
    /// The chassis itself.
    Chassis,
    /// One logical switch.
    Switch(u8),
}

/// Accumulated outcome for one scope.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OutcomeRecord {
    /// Display label for the scope; serialized once on the summary.
    #[serde(skip)]
    pub label: String,
    /// The scope was created during this run.
    pub created: bool,
    /// The scope was removed during this run.
    pub removed: bool,
    /// Ports moved into this scope.
    pub ports_added: usize,
    /// Ports moved out of this scope.
    pub ports_removed: usize,
    /// Ports that failed to move into this scope.
    pub ports_failed: usize,
    /// The zone database was replaced.
    pub zoning_changed: bool,
    /// Zone configuration activated on this scope, if any.
    pub enabled_zone_config: Option<String>,
    /// MAPS rules or the active policy changed.
    pub policy_changed: bool,
    /// Virtual fabrics were enabled (chassis scope only).
    pub vf_enabled: bool,
    /// User accounts created (chassis scope only).
    pub users_added: Vec<String>,
    /// Free-text diagnostics recorded against this scope.
    pub diagnostics: Vec<String>,
}

/// The set of outcome records for one run, keyed by scope.
#[derive(Debug, Default)]
pub struct RecordSet {
    records: BTreeMap<ScopeKey, OutcomeRecord>,
}

/// How the run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RunStatus {
    /// Every dispatched action ran to completion.
    Completed,
    /// A fatal or mandatory-action failure stopped the run early.
    Aborted {
        /// Why the run stopped.
        reason: String,
    },
    /// The user interrupted the run at an action boundary.
    Cancelled,
}

/// The final, presentation-facing summary of a run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Identifier of the run this report describes.
    pub run_id: Uuid,
    /// When the report was produced.
    pub finished_at: DateTime<Utc>,
    /// How the run ended.
    pub status: RunStatus,
    /// Per-scope summaries, chassis first.
    pub scopes: Vec<ScopeSummary>,
    /// Total number of diagnostics across all scopes.
    pub issues: usize,
}

/// One scope's rendered summary.
#[derive(Debug, Clone, Serialize)]
pub struct ScopeSummary {
    /// Display label for the scope.
    pub label: String,
    /// Fabric ID for switch scopes; absent for the chassis.
    pub fid: Option<u8>,
    /// The record's accumulated counters and flags.
    #[serde(flatten)]
    pub outcome: OutcomeRecord,
}

impl RecordSet {
    /// Returns the chassis record, creating it on first touch.
    pub fn chassis(&mut self, label: &str) -> &mut OutcomeRecord {
        let record = self.records.entry(ScopeKey::Chassis).or_default();
        if record.label.is_empty() {
            record.label = label.to_string();
        }
        record
    }

    /// Returns a switch record, creating it on first touch.
    pub fn switch(&mut self, fid: u8, label: &str) -> &mut OutcomeRecord {
        let record = self.records.entry(ScopeKey::Switch(fid)).or_default();
        if record.label.is_empty() {
            record.label = label.to_string();
        }
        record
    }

    /// Looks up a record without creating it.
    #[must_use]
    pub fn get(&self, key: ScopeKey) -> Option<&OutcomeRecord> {
        self.records.get(&key)
    }

    /// Iterates records in scope order, chassis first.
    pub fn iter(&self) -> impl Iterator<Item = (ScopeKey, &OutcomeRecord)> {
        self.records.iter().map(|(k, v)| (*k, v))
    }

    /// True if no action touched any scope.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Report {
    /// Aggregates the record set into the final report.
    ///
    /// Pure: grouping, counting, and flattening only. The caller decides
    /// what the status means for the process exit code.
    #[must_use]
    pub fn summarize(run_id: Uuid, records: &RecordSet, status: RunStatus) -> Self {
        let scopes: Vec<ScopeSummary> = records
            .iter()
            .map(|(key, record)| ScopeSummary {
                label: record.label.clone(),
                fid: match key {
                    ScopeKey::Chassis => None,
                    ScopeKey::Switch(fid) => Some(fid),
                },
                outcome: record.clone(),
            })
            .collect();

        let issues = scopes.iter().map(|s| s.outcome.diagnostics.len()).sum();

        Self {
            run_id,
            finished_at: Utc::now(),
            status,
            scopes,
            issues,
        }
    }

    /// True if any scope carries diagnostics.
    #[must_use]
    pub const fn has_issues(&self) -> bool {
        self.issues > 0
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Aborted { reason } => write!(f, "aborted: {reason}"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Restore run {} {}", self.run_id, self.status)?;
        for scope in &self.scopes {
            writeln!(f, "\n{}", scope.label)?;
            let o = &scope.outcome;
            if o.created {
                writeln!(f, "  Created")?;
            }
            if o.removed {
                writeln!(f, "  Removed")?;
            }
            if o.vf_enabled {
                writeln!(f, "  Virtual fabrics enabled")?;
            }
            if o.ports_added + o.ports_removed + o.ports_failed > 0 {
                writeln!(
                    f,
                    "  Ports: {} added, {} removed, {} failed",
                    o.ports_added, o.ports_removed, o.ports_failed
                )?;
            }
            if o.zoning_changed {
                writeln!(f, "  Zoning replaced")?;
            }
            if let Some(cfg) = &o.enabled_zone_config {
                writeln!(f, "  Zone configuration enabled: {cfg}")?;
            }
            if o.policy_changed {
                writeln!(f, "  MAPS policies updated")?;
            }
            for user in &o.users_added {
                writeln!(f, "  User added: {user}")?;
            }
            for diagnostic in &o.diagnostics {
                writeln!(f, "  ! {diagnostic}")?;
            }
        }
        if self.issues > 0 {
            writeln!(f, "\nCompleted with {} issue(s), see above.", self.issues)?;
        }
        Ok(())
    }
}
