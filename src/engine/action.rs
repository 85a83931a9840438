//! Action descriptors and the static action table.
//!
//! Actions are data, not code paths: each descriptor names one gated,
//! idempotent unit of comparison-and-write, and the pipeline runner
//! dispatches on its [`ActionKind`]. Ordering dependencies are declared
//! structurally — a descriptor whose `checkpoint` flag is set stales the
//! target state tree, and the runner re-captures before the next action
//! that reads it — never by comment or convention.

use std::collections::BTreeSet;

use crate::error::ConfigError;
use crate::model::resources;

/// Restore categories gating which actions run.
///
/// `Always` is a pseudo-category that cannot be deselected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
    /// Mandatory; runs unconditionally.
    Always,
    /// Virtual-fabric clear: enable VF, delete non-default switches.
    VfClear,
    /// Virtual-fabric switches: create missing logical switches.
    VfSwitches,
    /// Virtual-fabric ports: move ports into their logical switches.
    VfPorts,
    /// Chassis settings.
    Chassis,
    /// Logical-switch settings.
    Switch,
    /// Port settings.
    Port,
    /// MAPS rules and policies.
    Maps,
    /// User accounts.
    Users,
    /// Zone database.
    Zoning,
    /// Zone-configuration activation.
    ZoneEnable,
    /// Enable switches and ports at the end of the run.
    Enable,
}

impl Category {
    /// The selector token for this category.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Always => "m",
            Self::VfClear => "vfc",
            Self::VfSwitches => "vfs",
            Self::VfPorts => "vfp",
            Self::Chassis => "c",
            Self::Switch => "s",
            Self::Port => "p",
            Self::Maps => "maps",
            Self::Users => "u",
            Self::Zoning => "z",
            Self::ZoneEnable => "ze",
            Self::Enable => "e",
        }
    }

    /// All selectable categories, in pipeline order.
    #[must_use]
    pub const fn selectable() -> &'static [Self] {
        &[
            Self::VfClear,
            Self::VfSwitches,
            Self::VfPorts,
            Self::Chassis,
            Self::Switch,
            Self::Port,
            Self::Maps,
            Self::Users,
            Self::Zoning,
            Self::ZoneEnable,
            Self::Enable,
        ]
    }

    /// Parses a comma-separated category selection.
    ///
    /// `*` selects every category. The `Always` pseudo-category is never
    /// part of the selection; mandatory actions run regardless.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown token.
    pub fn parse_selection(raw: &str) -> Result<BTreeSet<Self>, ConfigError> {
        let mut selected = BTreeSet::new();
        for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if token == "*" {
                selected.extend(Self::selectable().iter().copied());
                continue;
            }
            let category = Self::selectable()
                .iter()
                .copied()
                .find(|c| c.token() == token)
                .ok_or_else(|| ConfigError::UnknownCategory {
                    token: token.to_string(),
                })?;
            selected.insert(category);
        }
        Ok(selected)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// What an action does, as data the runner dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Initial capture of the target state tree.
    CaptureBaseline,
    /// Build the identity map from the first capture.
    BuildIdentityMap,
    /// Enable virtual fabrics: disable chassis, patch, re-enable —
    /// a three-step sequence no other action may interrupt.
    EnableVirtualFabrics,
    /// Delete all non-default logical switches.
    ClearLogicalSwitches,
    /// Create logical switches missing on the target, applying
    /// identity-map overrides.
    CreateLogicalSwitches,
    /// Move ports from their current owner into the mapped switch.
    MovePorts,
    /// Patch one chassis-level resource under a whitelist.
    PatchChassis {
        /// Resource path to compare and write.
        resource: &'static str,
        /// Attributes the action may compare and mutate.
        whitelist: &'static [&'static str],
    },
    /// Create user accounts missing on the target.
    CreateUsers {
        /// Attributes copied onto the new account.
        whitelist: &'static [&'static str],
    },
    /// Patch one per-switch resource under a whitelist.
    PatchSwitch {
        /// Resource path to compare and write.
        resource: &'static str,
        /// Attributes the action may compare and mutate.
        whitelist: &'static [&'static str],
    },
    /// Patch port attributes under a whitelist.
    PatchPorts {
        /// Attributes the action may compare and mutate.
        whitelist: &'static [&'static str],
    },
    /// Queue command-line-only port settings that differ.
    QueueCliPortSettings,
    /// Flush the queued CLI commands, then wait for the device's two
    /// control paths to converge.
    FlushCliQueue,
    /// Replicate MAPS rules and the active policy.
    SyncMaps,
    /// Mark the run for zone-configuration activation.
    MarkZoneActivation,
    /// Replace the zone database wholesale when membership differs.
    RestoreZoning,
    /// Enable switches and ports that were enabled on the reference.
    EnableAll,
}

/// One entry of the action table.
#[derive(Debug, Clone, Copy)]
pub struct ActionDescriptor {
    /// Stable action name, used in logs and diagnostics.
    pub name: &'static str,
    /// Category gating this action.
    pub category: Category,
    /// True if running this action stales the target state tree.
    pub checkpoint: bool,
    /// True if a structural failure here aborts the run.
    pub mandatory: bool,
    /// What the action does.
    pub kind: ActionKind,
}

impl ActionDescriptor {
    /// True if this action runs under the given category selection.
    #[must_use]
    pub fn enabled(&self, selection: &BTreeSet<Category>) -> bool {
        self.category == Category::Always || selection.contains(&self.category)
    }

    /// Resources this action reads: (chassis-level, per-switch).
    #[must_use]
    pub fn capture_resources(&self) -> (Vec<&'static str>, Vec<&'static str>) {
        match self.kind {
            ActionKind::EnableVirtualFabrics => (vec![resources::CHASSIS], vec![]),
            ActionKind::ClearLogicalSwitches | ActionKind::BuildIdentityMap => {
                (vec![resources::LOGICAL_SWITCH], vec![])
            }
            ActionKind::CreateLogicalSwitches => {
                (vec![resources::LOGICAL_SWITCH], vec![resources::FC_SWITCH])
            }
            ActionKind::MovePorts => {
                (vec![resources::LOGICAL_SWITCH], vec![resources::FC_PORTS])
            }
            ActionKind::PatchChassis { resource, .. } => (vec![resource], vec![]),
            ActionKind::CreateUsers { .. } => (vec![resources::USER_CONFIG], vec![]),
            ActionKind::PatchSwitch { resource, .. } => (vec![], vec![resource]),
            ActionKind::PatchPorts { .. }
            | ActionKind::QueueCliPortSettings
            | ActionKind::EnableAll => (vec![], vec![resources::FC_PORTS]),
            ActionKind::SyncMaps => {
                (vec![], vec![resources::MAPS_RULE, resources::MAPS_POLICY])
            }
            ActionKind::RestoreZoning => (
                vec![],
                vec![resources::ZONING_DEFINED, resources::ZONING_EFFECTIVE],
            ),
            ActionKind::CaptureBaseline
            | ActionKind::FlushCliQueue
            | ActionKind::MarkZoneActivation => (vec![], vec![]),
        }
    }

    /// True if this action reads the target state tree.
    ///
    /// Pure bookkeeping actions do not force a re-capture when the tree
    /// is stale.
    #[must_use]
    pub const fn reads_target(&self) -> bool {
        !matches!(
            self.kind,
            ActionKind::CaptureBaseline
                | ActionKind::FlushCliQueue
                | ActionKind::MarkZoneActivation
        )
    }
}

/// Chassis settings restored under the `c` category.
pub const CHASSIS_SETTINGS: &[&str] = &[
    "chassis-user-friendly-name",
    "fcr-enabled",
    "shell-timeout",
    "session-timeout",
    "tcp-timeout-level",
];

/// The virtual-fabrics mode attribute.
pub const VF_SETTINGS: &[&str] = &["vf-enabled"];

/// Logical-switch settings restored under the `s` category.
///
/// The domain ID and switch name are deliberately absent — they are set
/// when the switch is created, under identity-map control.
pub const FC_SWITCH_SETTINGS: &[&str] = &[
    "fabric-user-friendly-name",
    "banner",
    "ag-mode",
    "in-order-delivery-enabled",
    "dynamic-load-sharing",
    "advanced-performance-tuning-policy",
    "switch-persistent-enabled",
    "insistent-domain-id-enabled",
];

/// Attributes that must not be set on a FICON-mode target switch.
pub const FICON_SENSITIVE_SETTINGS: &[&str] = &["insistent-domain-id-enabled"];

/// Switch-configuration settings restored under the `s` category.
pub const SWITCH_CONFIG_SETTINGS: &[&str] = &[
    "trunk-enabled",
    "wwn-port-id-mode",
    "edge-hold-time",
    "area-mode",
    "xisl-enabled",
];

/// Port-naming settings restored under the `s` category.
pub const PORT_CONFIG_SETTINGS: &[&str] = &[
    "portname-mode",
    "dynamic-portname-format",
    "dynamic-d-port-enabled",
    "on-demand-d-port-enabled",
];

/// Port settings restored through the API under the `p` category.
pub const PORT_SETTINGS: &[&str] = &[
    "speed",
    "user-friendly-name",
    "npiv-enabled",
    "npiv-pp-limit",
    "persistent-disable",
    "qos-enabled",
    "compression-configured",
    "encryption-enabled",
    "fec-enabled",
    "credit-recovery-enabled",
    "trunk-port-enabled",
    "mirror-port-enabled",
    "rscn-suppression-enabled",
    "target-driven-zoning-enable",
];

/// Attributes copied onto newly created user accounts.
pub const USER_SETTINGS: &[&str] = &[
    "name",
    "account-description",
    "account-enabled",
    "access-start-time",
    "access-end-time",
    "home-virtual-fabric",
    "chassis-access-role",
    "virtual-fabric-role-id-list",
];

/// The ordered action table driving every restore run.
///
/// Execution order is fixed; category gating selects the subset.
pub const ACTION_TABLE: &[ActionDescriptor] = &[
    ActionDescriptor {
        name: "capture-baseline",
        category: Category::Always,
        checkpoint: false,
        mandatory: true,
        kind: ActionKind::CaptureBaseline,
    },
    ActionDescriptor {
        name: "build-identity-map",
        category: Category::Always,
        checkpoint: false,
        mandatory: true,
        kind: ActionKind::BuildIdentityMap,
    },
    ActionDescriptor {
        name: "enable-virtual-fabrics",
        category: Category::VfClear,
        checkpoint: true,
        mandatory: false,
        kind: ActionKind::EnableVirtualFabrics,
    },
    ActionDescriptor {
        name: "clear-logical-switches",
        category: Category::VfClear,
        checkpoint: true,
        mandatory: false,
        kind: ActionKind::ClearLogicalSwitches,
    },
    ActionDescriptor {
        name: "create-logical-switches",
        category: Category::VfSwitches,
        checkpoint: true,
        mandatory: false,
        kind: ActionKind::CreateLogicalSwitches,
    },
    ActionDescriptor {
        name: "move-ports",
        category: Category::VfPorts,
        checkpoint: true,
        mandatory: false,
        kind: ActionKind::MovePorts,
    },
    ActionDescriptor {
        name: "chassis-settings",
        category: Category::Chassis,
        checkpoint: false,
        mandatory: false,
        kind: ActionKind::PatchChassis {
            resource: resources::CHASSIS,
            whitelist: CHASSIS_SETTINGS,
        },
    },
    ActionDescriptor {
        name: "user-accounts",
        category: Category::Users,
        checkpoint: false,
        mandatory: false,
        kind: ActionKind::CreateUsers {
            whitelist: USER_SETTINGS,
        },
    },
    ActionDescriptor {
        name: "switch-settings",
        category: Category::Switch,
        checkpoint: false,
        mandatory: false,
        kind: ActionKind::PatchSwitch {
            resource: resources::FC_SWITCH,
            whitelist: FC_SWITCH_SETTINGS,
        },
    },
    ActionDescriptor {
        name: "switch-configuration",
        category: Category::Switch,
        checkpoint: false,
        mandatory: false,
        kind: ActionKind::PatchSwitch {
            resource: resources::SWITCH_CONFIG,
            whitelist: SWITCH_CONFIG_SETTINGS,
        },
    },
    ActionDescriptor {
        name: "port-naming",
        category: Category::Switch,
        checkpoint: false,
        mandatory: false,
        kind: ActionKind::PatchSwitch {
            resource: resources::PORT_CONFIG,
            whitelist: PORT_CONFIG_SETTINGS,
        },
    },
    ActionDescriptor {
        name: "port-settings",
        category: Category::Port,
        checkpoint: false,
        mandatory: false,
        kind: ActionKind::PatchPorts {
            whitelist: PORT_SETTINGS,
        },
    },
    ActionDescriptor {
        name: "queue-cli-port-settings",
        category: Category::Port,
        checkpoint: false,
        mandatory: false,
        kind: ActionKind::QueueCliPortSettings,
    },
    ActionDescriptor {
        name: "flush-cli-queue",
        category: Category::Port,
        checkpoint: true,
        mandatory: false,
        kind: ActionKind::FlushCliQueue,
    },
    ActionDescriptor {
        name: "maps-policies",
        category: Category::Maps,
        checkpoint: false,
        mandatory: false,
        kind: ActionKind::SyncMaps,
    },
    ActionDescriptor {
        name: "mark-zone-activation",
        category: Category::ZoneEnable,
        checkpoint: false,
        mandatory: false,
        kind: ActionKind::MarkZoneActivation,
    },
    ActionDescriptor {
        name: "restore-zoning",
        category: Category::Zoning,
        checkpoint: false,
        mandatory: false,
        kind: ActionKind::RestoreZoning,
    },
    ActionDescriptor {
        name: "enable-switches-and-ports",
        category: Category::Enable,
        checkpoint: false,
        mandatory: false,
        kind: ActionKind::EnableAll,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selection_tokens() {
        let selection =
            Category::parse_selection("vfs, s,z").expect("selection should parse");
        assert!(selection.contains(&Category::VfSwitches));
        assert!(selection.contains(&Category::Switch));
        assert!(selection.contains(&Category::Zoning));
        assert_eq!(selection.len(), 3);
    }

    #[test]
    fn test_parse_selection_star_selects_all() {
        let selection = Category::parse_selection("*").expect("star should parse");
        assert_eq!(selection.len(), Category::selectable().len());
    }

    #[test]
    fn test_parse_selection_rejects_unknown() {
        let err = Category::parse_selection("vfs,bogus").expect_err("unknown token");
        assert!(matches!(err, ConfigError::UnknownCategory { token } if token == "bogus"));
    }

    #[test]
    fn test_mandatory_actions_always_enabled() {
        let empty = BTreeSet::new();
        let enabled: Vec<&str> = ACTION_TABLE
            .iter()
            .filter(|a| a.enabled(&empty))
            .map(|a| a.name)
            .collect();
        assert_eq!(enabled, vec!["capture-baseline", "build-identity-map"]);
    }

    #[test]
    fn test_shape_changing_actions_declare_checkpoints() {
        for name in [
            "enable-virtual-fabrics",
            "clear-logical-switches",
            "create-logical-switches",
            "move-ports",
            "flush-cli-queue",
        ] {
            let descriptor = ACTION_TABLE
                .iter()
                .find(|a| a.name == name)
                .expect("action should exist");
            assert!(descriptor.checkpoint, "{name} must declare a checkpoint");
        }
    }

    #[test]
    fn test_domain_and_name_not_in_switch_whitelist() {
        // Set at creation under identity-map control, never re-diffed.
        assert!(!FC_SWITCH_SETTINGS.contains(&"domain-id"));
        assert!(!FC_SWITCH_SETTINGS.contains(&"user-friendly-name"));
    }
}
