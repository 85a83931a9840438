//! Pipeline runner: executes the action table against one target device.
//!
//! The runner owns the target state tree and the outcome records for the
//! run's duration. It enforces category gating, re-captures the target
//! state at declared checkpoints, isolates failures to the smallest
//! scope, honors cancellation at action boundaries, and always finishes
//! by summarizing whatever was accumulated — aborted runs included.
//!
//! Execution is strictly sequential: each action's writes are observed
//! through the next capture before later actions reason about target
//! state. Parallelism belongs across independent devices, never within
//! one run.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ActionError, RestoreError};
use crate::fos::Transport;
use crate::model::{ChassisRecord, TargetState};

use super::action::{ACTION_TABLE, ActionDescriptor, ActionKind, Category};
use super::capture::{CapturePlan, capture};
use super::identity::{IdentityEntry, IdentityMap, MappingRule};
use super::report::{RecordSet, Report, RunStatus};

/// Default settle delay after flushing CLI-path commands.
///
/// The device's API and CLI control paths converge asynchronously; this
/// is the observed worst case.
const DEFAULT_CLI_SETTLE: Duration = Duration::from_secs(10);

/// Run-wide configuration for one pipeline execution.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Requested restore categories; mandatory actions run regardless.
    pub categories: BTreeSet<Category>,
    /// Settle delay after flushing the CLI queue.
    pub cli_settle: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            categories: BTreeSet::new(),
            cli_settle: DEFAULT_CLI_SETTLE,
        }
    }
}

impl PipelineConfig {
    /// Creates a configuration for the given category selection.
    #[must_use]
    pub fn for_categories(categories: BTreeSet<Category>) -> Self {
        Self {
            categories,
            ..Self::default()
        }
    }
}

/// Cooperative cancellation flag shared with a signal handler.
///
/// Checked at action boundaries only; an in-flight write always
/// completes so the target is never left half-mutated.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates a new, unset flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation at the next action boundary.
    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// True if cancellation was requested.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The pipeline runner for one device.
///
/// Owns the target state tree, the identity map (after it is built), and
/// the outcome records; none of these are shared across concurrent runs.
pub struct Pipeline<'a, T: Transport> {
    /// Transport session, owned by this run for its duration.
    pub(super) transport: &'a T,
    /// The immutable reference chassis being replayed.
    pub(super) reference: &'a ChassisRecord,
    /// Raw mapping rules; validated when the identity map is built.
    pub(super) rules: Vec<MappingRule>,
    /// Run configuration.
    pub(super) config: PipelineConfig,
    /// Cancellation flag.
    cancel: CancelFlag,
    /// Identifier of this run.
    run_id: Uuid,
    /// The identity map, empty until `build-identity-map` runs.
    pub(super) identity: IdentityMap,
    /// The mutable mirror of the live chassis.
    pub(super) target: TargetState,
    /// Per-scope outcome records.
    pub(super) records: RecordSet,
    /// CLI commands queued for a later flush, as (fid, command) pairs.
    pub(super) cli_queue: Vec<(u8, String)>,
    /// Set when the zone-activation marker action ran.
    pub(super) activate_zones: bool,
    /// True when a checkpointed action staled the target tree.
    stale: bool,
}

impl<'a, T: Transport> Pipeline<'a, T> {
    /// Creates a runner for one reference/target pair.
    #[must_use]
    pub fn new(
        transport: &'a T,
        reference: &'a ChassisRecord,
        rules: Vec<MappingRule>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            transport,
            reference,
            rules,
            config,
            cancel: CancelFlag::new(),
            run_id: Uuid::new_v4(),
            identity: IdentityMap::default(),
            target: TargetState::default(),
            records: RecordSet::default(),
            cli_queue: Vec::new(),
            activate_zones: false,
            stale: false,
        }
    }

    /// Installs a cancellation flag shared with the caller.
    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Identifier of this run.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Executes the action table and returns the final report.
    ///
    /// Fatal errors stop dispatching further actions but the report is
    /// always produced from whatever was accumulated.
    pub async fn run(mut self) -> Report {
        info!(run_id = %self.run_id, "Starting restore run");

        let plan = self.capture_plan();
        let mut status = RunStatus::Completed;

        for descriptor in ACTION_TABLE {
            if !descriptor.enabled(&self.config.categories) {
                debug!("Skipping gated-off action: {}", descriptor.name);
                continue;
            }

            if self.cancel.is_set() {
                warn!("Cancellation requested; stopping before {}", descriptor.name);
                status = RunStatus::Cancelled;
                break;
            }

            if self.stale && descriptor.reads_target() {
                debug!("Target state stale; re-capturing before {}", descriptor.name);
                match capture(self.transport, &plan).await {
                    Ok(state) => {
                        self.target = state;
                        self.stale = false;
                    }
                    Err(e) => {
                        status = RunStatus::Aborted {
                            reason: e.to_string(),
                        };
                        break;
                    }
                }
            }

            info!("Running action: {}", descriptor.name);
            match self.execute(descriptor, &plan).await {
                Ok(()) => {
                    if descriptor.checkpoint {
                        self.stale = true;
                    }
                }
                Err(RestoreError::Action(ActionError::Structural { action, reason }))
                    if !descriptor.mandatory =>
                {
                    warn!("Action {action} skipped: {reason}");
                    self.records
                        .chassis(self.reference.label())
                        .diagnostics
                        .push(format!("Action {action} skipped: {reason}"));
                }
                Err(e) => {
                    warn!("Run aborted during {}: {e}", descriptor.name);
                    status = RunStatus::Aborted {
                        reason: e.to_string(),
                    };
                    break;
                }
            }
        }

        let report = Report::summarize(self.run_id, &self.records, status);
        info!(run_id = %self.run_id, "Restore run {}", report.status);
        report
    }

    /// Dispatches one action by its kind.
    async fn execute(
        &mut self,
        descriptor: &ActionDescriptor,
        plan: &CapturePlan,
    ) -> Result<(), RestoreError> {
        match descriptor.kind {
            ActionKind::CaptureBaseline => {
                self.target = capture(self.transport, plan).await?;
                Ok(())
            }
            ActionKind::BuildIdentityMap => self.build_identity_map(),
            ActionKind::EnableVirtualFabrics => self.enable_virtual_fabrics().await,
            ActionKind::ClearLogicalSwitches => self.clear_logical_switches().await,
            ActionKind::CreateLogicalSwitches => self.create_logical_switches().await,
            ActionKind::MovePorts => self.move_ports().await,
            ActionKind::PatchChassis {
                resource,
                whitelist,
            } => self.patch_chassis(resource, whitelist).await,
            ActionKind::CreateUsers { whitelist } => self.create_users(whitelist).await,
            ActionKind::PatchSwitch {
                resource,
                whitelist,
            } => self.patch_switch(resource, whitelist).await,
            ActionKind::PatchPorts { whitelist } => self.patch_ports(whitelist).await,
            ActionKind::QueueCliPortSettings => {
                self.queue_cli_port_settings();
                Ok(())
            }
            ActionKind::FlushCliQueue => self.flush_cli_queue().await,
            ActionKind::SyncMaps => self.sync_maps().await,
            ActionKind::MarkZoneActivation => {
                self.activate_zones = true;
                Ok(())
            }
            ActionKind::RestoreZoning => self.restore_zoning().await,
            ActionKind::EnableAll => self.enable_all().await,
        }
    }

    /// Builds the capture plan from the enabled actions.
    fn capture_plan(&self) -> CapturePlan {
        let mut plan = CapturePlan::base();
        for descriptor in ACTION_TABLE {
            if !descriptor.enabled(&self.config.categories) {
                continue;
            }
            let (chassis_resources, switch_resources) = descriptor.capture_resources();
            for resource in chassis_resources {
                plan.add_chassis_resource(resource);
            }
            for resource in switch_resources {
                plan.add_switch_resource(resource);
            }
        }
        plan
    }

    /// Validates the mapping rules into the identity map.
    fn build_identity_map(&mut self) -> Result<(), RestoreError> {
        let (identity, diagnostics) = IdentityMap::build(self.reference, &self.rules);

        for diagnostic in &diagnostics {
            warn!("{diagnostic}");
            self.records
                .chassis(self.reference.label())
                .diagnostics
                .push(diagnostic.to_string());
        }

        if identity.is_empty() {
            return Err(crate::error::MappingError::NoUsableEntries {
                diagnostics: diagnostics.len(),
            }
            .into());
        }

        debug!("Identity map holds {} entries", identity.len());
        self.identity = identity;
        Ok(())
    }

    /// Snapshot of the identity entries, for handlers that mutate `self`
    /// while iterating.
    pub(super) fn identity_entries(&self) -> Vec<IdentityEntry> {
        self.identity.iter().cloned().collect()
    }

    /// Display label for a mapped target switch.
    pub(super) fn entry_label(&self, entry: &IdentityEntry) -> String {
        entry.switch_name.as_ref().map_or_else(
            || {
                self.target
                    .switch(entry.target_fid)
                    .map_or_else(|| format!("FID {}", entry.target_fid), |s| s.label())
            },
            |name| format!("{name} FID {}", entry.target_fid),
        )
    }

    /// Records a diagnostic against one switch scope.
    pub(super) fn switch_diagnostic(&mut self, fid: u8, label: &str, message: String) {
        warn!("{label}: {message}");
        self.records.switch(fid, label).diagnostics.push(message);
    }

    /// Records a diagnostic against the chassis scope.
    pub(super) fn chassis_diagnostic(&mut self, message: String) {
        warn!("chassis: {message}");
        self.records
            .chassis(self.reference.label())
            .diagnostics
            .push(message);
    }
}
