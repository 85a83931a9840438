//! Zone database model.
//!
//! A logical switch's zoning is captured as a defined configuration
//! (aliases, zones, zone configs) plus the name of the effective
//! configuration, if any. Membership lists are compared order-insensitively
//! by the engine; this module only models the data and its wire shape.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Zone type discriminator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    /// Ordinary zone: all members may talk to each other.
    #[default]
    Standard,
    /// Peer zone: principal members talk to non-principal members.
    Peer,
}

/// One zone definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Zone {
    /// Zone type.
    #[serde(default)]
    pub kind: ZoneKind,
    /// Zone members (aliases or WWNs).
    #[serde(default)]
    pub members: Vec<String>,
    /// Principal members (peer zones only).
    #[serde(default)]
    pub principal_members: Vec<String>,
}

/// The zone database of one logical switch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ZoneDb {
    /// Aliases by name, each a membership list.
    #[serde(default)]
    pub aliases: BTreeMap<String, Vec<String>>,
    /// Zones by name.
    #[serde(default)]
    pub zones: BTreeMap<String, Zone>,
    /// Zone configurations by name, each a list of zone names.
    #[serde(default)]
    pub configs: BTreeMap<String, Vec<String>>,
    /// Name of the effective configuration, if one is enabled.
    #[serde(default)]
    pub effective: Option<String>,
}

impl ZoneKind {
    /// Wire encoding of the zone type.
    #[must_use]
    pub const fn wire_code(self) -> u8 {
        match self {
            Self::Standard => 0,
            Self::Peer => 1,
        }
    }

    /// Decodes the wire zone type; unknown codes fall back to standard.
    #[must_use]
    pub const fn from_wire_code(code: u8) -> Self {
        match code {
            1 => Self::Peer,
            _ => Self::Standard,
        }
    }
}

impl ZoneDb {
    /// Returns true if the database defines nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty() && self.zones.is_empty() && self.configs.is_empty()
    }

    /// Parses a defined-configuration resource payload.
    ///
    /// The effective configuration is carried by a separate resource and
    /// filled in by the caller.
    #[must_use]
    pub fn from_defined_payload(payload: &Value) -> Self {
        let defined = payload.get("defined-configuration").unwrap_or(payload);
        let mut db = Self::default();

        for alias in defined
            .get("alias")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
        {
            if let Some(name) = alias.get("alias-name").and_then(Value::as_str) {
                let members =
                    string_list(alias.pointer("/member-entry/alias-entry-name"));
                db.aliases.insert(name.to_string(), members);
            }
        }

        for zone in defined
            .get("zone")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
        {
            if let Some(name) = zone.get("zone-name").and_then(Value::as_str) {
                let kind = zone
                    .get("zone-type")
                    .and_then(Value::as_u64)
                    .map_or(ZoneKind::Standard, |c| {
                        ZoneKind::from_wire_code(u8::try_from(c).unwrap_or(0))
                    });
                db.zones.insert(
                    name.to_string(),
                    Zone {
                        kind,
                        members: string_list(zone.pointer("/member-entry/entry-name")),
                        principal_members: string_list(
                            zone.pointer("/member-entry/principal-entry-name"),
                        ),
                    },
                );
            }
        }

        for cfg in defined
            .get("cfg")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
        {
            if let Some(name) = cfg.get("cfg-name").and_then(Value::as_str) {
                let zones = string_list(cfg.pointer("/member-zone/zone-name"));
                db.configs.insert(name.to_string(), zones);
            }
        }

        db
    }

    /// Renders the defined configuration as a wire payload.
    #[must_use]
    pub fn to_defined_payload(&self) -> Value {
        let aliases: Vec<Value> = self
            .aliases
            .iter()
            .map(|(name, members)| {
                json!({
                    "alias-name": name,
                    "member-entry": {"alias-entry-name": members},
                })
            })
            .collect();

        let zones: Vec<Value> = self
            .zones
            .iter()
            .map(|(name, zone)| {
                json!({
                    "zone-name": name,
                    "zone-type": zone.kind.wire_code(),
                    "member-entry": {
                        "entry-name": zone.members,
                        "principal-entry-name": zone.principal_members,
                    },
                })
            })
            .collect();

        let cfgs: Vec<Value> = self
            .configs
            .iter()
            .map(|(name, zones)| {
                json!({
                    "cfg-name": name,
                    "member-zone": {"zone-name": zones},
                })
            })
            .collect();

        json!({
            "defined-configuration": {
                "alias": aliases,
                "zone": zones,
                "cfg": cfgs,
            }
        })
    }
}

/// Extracts a list of strings from an optional JSON array.
fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defined_payload_round_trip() {
        let mut db = ZoneDb::default();
        db.aliases
            .insert(String::from("host_a"), vec![String::from("10:00:00:00:00:00:00:01")]);
        db.zones.insert(
            String::from("z_prod"),
            Zone {
                kind: ZoneKind::Standard,
                members: vec![String::from("host_a"), String::from("array_1")],
                principal_members: vec![],
            },
        );
        db.configs
            .insert(String::from("cfg_main"), vec![String::from("z_prod")]);

        let parsed = ZoneDb::from_defined_payload(&db.to_defined_payload());
        assert_eq!(parsed.aliases, db.aliases);
        assert_eq!(parsed.zones, db.zones);
        assert_eq!(parsed.configs, db.configs);
    }

    #[test]
    fn test_peer_zone_wire_code() {
        assert_eq!(ZoneKind::Peer.wire_code(), 1);
        assert_eq!(ZoneKind::from_wire_code(1), ZoneKind::Peer);
        assert_eq!(ZoneKind::from_wire_code(42), ZoneKind::Standard);
    }

    #[test]
    fn test_missing_sections_parse_empty() {
        let db = ZoneDb::from_defined_payload(&json!({"defined-configuration": {}}));
        assert!(db.is_empty());
    }
}
