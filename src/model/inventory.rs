//! Reference inventory and target state tree.
//!
//! Both sides of a restore share one shape: a chassis record owning
//! attribute bags per resource path, user accounts, and logical switches
//! which in turn own port attribute bags, a zone database, and MAPS
//! rules. The reference side is loaded once from a snapshot file and
//! never mutated; the target side is rebuilt from live captures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::error::{ConfigError, Result};

use super::zone::ZoneDb;

/// Snapshot format version accepted by the loader.
pub const SNAPSHOT_VERSION: &str = "1.0";

/// An opaque attribute bag keyed by leaf name.
pub type Attributes = BTreeMap<String, Value>;

/// Logical resource paths understood by capture and the action table.
pub mod resources {
    /// Chassis-level settings.
    pub const CHASSIS: &str = "chassis";
    /// User accounts defined on the chassis.
    pub const USER_CONFIG: &str = "chassis/user-config";
    /// Logical-switch inventory (FIDs, flags, port membership).
    pub const LOGICAL_SWITCH: &str = "logical-switch";
    /// Port members of a logical switch (write-side of port moves).
    pub const LOGICAL_SWITCH_PORT_MEMBERS: &str = "logical-switch/port-members";
    /// Per-switch settings: names, domain ID, enabled state.
    pub const FC_SWITCH: &str = "fibrechannel-switch";
    /// Per-switch settings: trunking, addressing modes.
    pub const SWITCH_CONFIG: &str = "switch-configuration";
    /// Per-switch settings: port naming behavior.
    pub const PORT_CONFIG: &str = "port-configuration";
    /// Fibre Channel ports of a logical switch.
    pub const FC_PORTS: &str = "fibrechannel";
    /// Defined zone configuration of a logical switch.
    pub const ZONING_DEFINED: &str = "zoning/defined-configuration";
    /// Effective zone configuration of a logical switch.
    pub const ZONING_EFFECTIVE: &str = "zoning/effective-configuration";
    /// MAPS rules of a logical switch.
    pub const MAPS_RULE: &str = "maps/rule";
    /// Active MAPS policy of a logical switch.
    pub const MAPS_POLICY: &str = "maps/active-policy";
    /// Command-line channel for settings the API cannot express.
    pub const CLI_COMMAND: &str = "cli/command";
}

/// Builds the request path for a per-switch resource.
#[must_use]
pub fn fid_path(resource: &str, fid: u8) -> String {
    format!("{resource}?fid={fid}")
}

/// One logical switch: flags, attribute bags, ports, zoning, MAPS.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SwitchRecord {
    /// Fabric ID of the switch (1–128).
    pub fid: u8,
    /// True for the chassis's default logical switch.
    #[serde(default)]
    pub default_switch: bool,
    /// True for a base switch (inter-fabric routing).
    #[serde(default)]
    pub base_switch: bool,
    /// True for a FICON-mode switch.
    #[serde(default)]
    pub ficon_switch: bool,
    /// Attribute bags keyed by resource path.
    #[serde(default)]
    pub attributes: BTreeMap<String, Attributes>,
    /// Port attribute bags keyed by `slot/port` name.
    #[serde(default)]
    pub ports: BTreeMap<String, Attributes>,
    /// Zone database, when zoning data was captured.
    #[serde(default)]
    pub zoning: Option<ZoneDb>,
    /// Non-default MAPS rules, one attribute bag each.
    #[serde(default)]
    pub maps_rules: Vec<Attributes>,
    /// Name of the active MAPS policy.
    #[serde(default)]
    pub maps_active_policy: Option<String>,
}

/// One chassis: settings, users, and logical switches.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChassisRecord {
    /// World-wide name identifying the chassis.
    pub wwn: String,
    /// Attribute bags keyed by resource path.
    #[serde(default)]
    pub attributes: BTreeMap<String, Attributes>,
    /// User accounts, one attribute bag each.
    #[serde(default)]
    pub users: Vec<Attributes>,
    /// Logical switches keyed by fabric ID.
    #[serde(default)]
    pub switches: BTreeMap<u8, SwitchRecord>,
}

/// Immutable snapshot of one or more captured chassis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceInventory {
    /// Snapshot format version.
    pub version: String,
    /// When the snapshot was captured.
    pub captured_at: DateTime<Utc>,
    /// Captured chassis.
    pub chassis: Vec<ChassisRecord>,
}

/// Mutable mirror of the live target chassis.
///
/// Discarded and rebuilt after any action that may have changed its
/// shape; resources whose read failed at the application level are
/// recorded in `partial` and must be treated as absent, never as empty.
#[derive(Debug, Clone, Default)]
pub struct TargetState {
    /// The captured chassis tree.
    pub chassis: ChassisRecord,
    /// Request paths whose read failed; data under them is unknown.
    pub partial: BTreeSet<String>,
}

impl SwitchRecord {
    /// Returns a named attribute from one of the switch's resource bags.
    #[must_use]
    pub fn attr(&self, resource: &str, name: &str) -> Option<&Value> {
        self.attributes.get(resource).and_then(|bag| bag.get(name))
    }

    /// The switch's user-friendly name, if set.
    #[must_use]
    pub fn switch_name(&self) -> Option<&str> {
        self.attr(resources::FC_SWITCH, "user-friendly-name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// The fabric's user-friendly name, if set.
    #[must_use]
    pub fn fabric_name(&self) -> Option<&str> {
        self.attr(resources::FC_SWITCH, "fabric-user-friendly-name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// The switch's domain ID, if known.
    #[must_use]
    pub fn domain_id(&self) -> Option<u8> {
        self.attr(resources::FC_SWITCH, "domain-id")
            .and_then(Value::as_u64)
            .and_then(|v| u8::try_from(v).ok())
    }

    /// True if the switch is administratively enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.attr(resources::FC_SWITCH, "enabled-state")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// True if the named port is administratively enabled.
    #[must_use]
    pub fn is_port_enabled(&self, port: &str) -> bool {
        self.ports
            .get(port)
            .and_then(|attrs| attrs.get("enabled-state"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// A display label for log and report lines.
    #[must_use]
    pub fn label(&self) -> String {
        self.switch_name().map_or_else(
            || format!("FID {}", self.fid),
            |name| format!("{name} FID {}", self.fid),
        )
    }
}

impl ChassisRecord {
    /// Returns a named attribute from one of the chassis resource bags.
    #[must_use]
    pub fn attr(&self, resource: &str, name: &str) -> Option<&Value> {
        self.attributes.get(resource).and_then(|bag| bag.get(name))
    }

    /// True if virtual fabrics are enabled on the chassis.
    #[must_use]
    pub fn vf_enabled(&self) -> bool {
        self.attr(resources::CHASSIS, "vf-enabled")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// The chassis's user-friendly name, falling back to its WWN.
    #[must_use]
    pub fn label(&self) -> &str {
        self.attr(resources::CHASSIS, "chassis-user-friendly-name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.wwn)
    }

    /// Fabric IDs of all logical switches, ascending.
    #[must_use]
    pub fn fids(&self) -> Vec<u8> {
        self.switches.keys().copied().collect()
    }

    /// The default logical switch's fabric ID, if present.
    #[must_use]
    pub fn default_switch_fid(&self) -> Option<u8> {
        self.switches
            .values()
            .find(|s| s.default_switch)
            .map(|s| s.fid)
    }

    /// Looks up a logical switch by fabric ID.
    #[must_use]
    pub fn switch(&self, fid: u8) -> Option<&SwitchRecord> {
        self.switches.get(&fid)
    }
}

impl ReferenceInventory {
    /// Loads a snapshot from a JSON file produced by a prior capture.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unparseable, or carries
    /// an unsupported snapshot version.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                crate::error::RestoreError::Config(ConfigError::FileNotFound {
                    path: path.to_path_buf(),
                })
            } else {
                crate::error::RestoreError::Io(e)
            }
        })?;

        let inventory: Self = serde_json::from_str(&text)
            .map_err(|e| ConfigError::parse("snapshot", e.to_string()))?;

        if inventory.version != SNAPSHOT_VERSION {
            return Err(ConfigError::validation(
                format!(
                    "Unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                    inventory.version
                ),
                "version",
            )
            .into());
        }

        Ok(inventory)
    }

    /// Selects the chassis to restore from.
    ///
    /// With a WWN the matching chassis is returned; without one the
    /// snapshot must contain exactly one chassis.
    ///
    /// # Errors
    ///
    /// Returns an error if the WWN does not match or the snapshot holds
    /// zero or multiple chassis and no WWN was given.
    pub fn select_chassis(&self, wwn: Option<&str>) -> std::result::Result<&ChassisRecord, ConfigError> {
        if let Some(wwn) = wwn {
            return self
                .chassis
                .iter()
                .find(|c| c.wwn == wwn)
                .ok_or_else(|| ConfigError::ChassisSelection {
                    message: format!("No chassis with WWN {wwn} in the snapshot"),
                });
        }

        match self.chassis.len() {
            0 => Err(ConfigError::ChassisSelection {
                message: String::from("The snapshot contains no chassis"),
            }),
            1 => Ok(&self.chassis[0]),
            n => Err(ConfigError::ChassisSelection {
                message: format!(
                    "The snapshot contains {n} chassis; select one with --wwn"
                ),
            }),
        }
    }
}

impl TargetState {
    /// True if the given request path failed to read during capture.
    #[must_use]
    pub fn is_partial(&self, path: &str) -> bool {
        self.partial.contains(path)
    }

    /// Looks up a logical switch by fabric ID.
    #[must_use]
    pub fn switch(&self, fid: u8) -> Option<&SwitchRecord> {
        self.chassis.switches.get(&fid)
    }

    /// Returns the fabric ID currently owning the named port.
    #[must_use]
    pub fn port_owner(&self, port: &str) -> Option<u8> {
        self.chassis
            .switches
            .values()
            .find(|s| s.ports.contains_key(port))
            .map(|s| s.fid)
    }
}
