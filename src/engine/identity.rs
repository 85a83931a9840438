//! Identity map construction.
//!
//! Translates reference-side logical-switch identifiers into target-side
//! identifiers, with per-mapping overrides for the domain ID, switch
//! name, and fabric name. Building the map is a pure function over the
//! reference chassis and the mapping rules; bad rules are dropped with
//! diagnostics and processing continues — only a map with zero usable
//! entries is fatal, and that decision belongs to the caller.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::ChassisRecord;

/// Lowest valid fabric ID.
pub const FID_MIN: u8 = 1;
/// Highest valid fabric ID.
pub const FID_MAX: u8 = 128;
/// Lowest valid domain ID.
pub const DID_MIN: u8 = 1;
/// Highest valid domain ID.
pub const DID_MAX: u8 = 239;

/// Sentinel override value meaning "do not set this field at all".
const UNSET_SENTINEL: &str = "none";

/// One mapping rule as supplied by configuration.
///
/// All fields are raw strings; validation happens during
/// [`IdentityMap::build`] so each bad rule can be reported and dropped
/// individually. A missing `target` defaults to the reference FID; a
/// missing override inherits from the reference switch; the literal
/// `none` suppresses the field entirely.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MappingRule {
    /// Reference-side fabric ID.
    pub reference: String,
    /// Target fabric ID or range, e.g. `3` or `3-5`.
    #[serde(default)]
    pub target: Option<String>,
    /// Fabric name override.
    #[serde(default)]
    pub fabric_name: Option<String>,
    /// Domain ID override.
    #[serde(default)]
    pub domain_id: Option<String>,
    /// Switch name override.
    #[serde(default)]
    pub switch_name: Option<String>,
}

/// One resolved identity-map entry.
///
/// Override fields resolved to `None` mean "do not set"; the distinction
/// between "inherit" and "unset" has already been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityEntry {
    /// Fabric ID on the target chassis.
    pub target_fid: u8,
    /// Fabric ID of the corresponding reference switch.
    pub reference_fid: u8,
    /// Domain ID to set on the target switch.
    pub domain_id: Option<u8>,
    /// Switch name to set on the target switch.
    pub switch_name: Option<String>,
    /// Fabric name to set on the target switch.
    pub fabric_name: Option<String>,
}

/// The identity map: target fabric ID → resolved entry.
///
/// Built once after the first capture of the target and read-only
/// thereafter.
#[derive(Debug, Clone, Default)]
pub struct IdentityMap {
    entries: BTreeMap<u8, IdentityEntry>,
}

/// A non-fatal problem encountered while building the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Index of the offending rule, when attributable to one.
    pub rule: Option<usize>,
    /// Human-readable description.
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.rule {
            Some(index) => write!(f, "Mapping rule {index}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl Diagnostic {
    fn for_rule(rule: usize, message: impl Into<String>) -> Self {
        Self {
            rule: Some(rule),
            message: message.into(),
        }
    }
}

impl IdentityMap {
    /// Builds the map from the reference chassis and the mapping rules.
    ///
    /// An empty rule list defaults to the identity mapping over every
    /// reference fabric ID. Returns the map together with all
    /// diagnostics; the caller decides which are fatal.
    #[must_use]
    pub fn build(reference: &ChassisRecord, rules: &[MappingRule]) -> (Self, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let mut entries = BTreeMap::new();

        let default_rules: Vec<MappingRule>;
        let rules = if rules.is_empty() {
            default_rules = reference
                .fids()
                .into_iter()
                .map(|fid| MappingRule {
                    reference: fid.to_string(),
                    ..MappingRule::default()
                })
                .collect();
            &default_rules
        } else {
            rules
        };

        for (index, rule) in rules.iter().enumerate() {
            let Some(reference_fid) = parse_fid(&rule.reference) else {
                diagnostics.push(Diagnostic::for_rule(
                    index,
                    format!(
                        "Reference FID '{}' must be an integer in {FID_MIN}-{FID_MAX}",
                        rule.reference
                    ),
                ));
                continue;
            };

            let Some(reference_switch) = reference.switch(reference_fid) else {
                diagnostics.push(Diagnostic::for_rule(
                    index,
                    format!("FID {reference_fid} does not exist in the reference chassis"),
                ));
                continue;
            };

            let target_fids = match &rule.target {
                None => vec![reference_fid],
                Some(spec) => match parse_fid_range(spec) {
                    Ok(fids) => fids,
                    Err(message) => {
                        diagnostics.push(Diagnostic::for_rule(index, message));
                        continue;
                    }
                },
            };

            let domain_id = match resolve_override(rule.domain_id.as_deref()) {
                Override::Inherit => reference_switch.domain_id(),
                Override::Unset => None,
                Override::Set(raw) => match parse_did(raw) {
                    Some(did) => Some(did),
                    None => {
                        diagnostics.push(Diagnostic::for_rule(
                            index,
                            format!(
                                "Domain ID '{raw}' must be an integer in {DID_MIN}-{DID_MAX}"
                            ),
                        ));
                        continue;
                    }
                },
            };

            let switch_name = match resolve_override(rule.switch_name.as_deref()) {
                Override::Inherit => reference_switch.switch_name().map(String::from),
                Override::Unset => None,
                Override::Set(raw) => Some(String::from(raw)),
            };

            let fabric_name = match resolve_override(rule.fabric_name.as_deref()) {
                Override::Inherit => reference_switch.fabric_name().map(String::from),
                Override::Unset => None,
                Override::Set(raw) => Some(String::from(raw)),
            };

            for target_fid in target_fids {
                if entries.contains_key(&target_fid) {
                    diagnostics.push(Diagnostic::for_rule(
                        index,
                        format!("Target FID {target_fid} was already mapped; keeping this rule"),
                    ));
                }
                entries.insert(
                    target_fid,
                    IdentityEntry {
                        target_fid,
                        reference_fid,
                        domain_id,
                        switch_name: switch_name.clone(),
                        fabric_name: fabric_name.clone(),
                    },
                );
            }
        }

        (Self { entries }, diagnostics)
    }

    /// Returns the entry for a target fabric ID.
    #[must_use]
    pub fn get(&self, target_fid: u8) -> Option<&IdentityEntry> {
        self.entries.get(&target_fid)
    }

    /// Iterates entries in ascending target-FID order.
    pub fn iter(&self) -> impl Iterator<Item = &IdentityEntry> {
        self.entries.values()
    }

    /// Number of usable entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no rule survived validation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Tri-state interpretation of a raw override value.
enum Override<'a> {
    /// Take the value from the reference switch.
    Inherit,
    /// Do not set the field at all.
    Unset,
    /// Use this explicit value.
    Set(&'a str),
}

fn resolve_override(raw: Option<&str>) -> Override<'_> {
    match raw {
        None => Override::Inherit,
        Some(s) if s.is_empty() => Override::Inherit,
        Some(s) if s.eq_ignore_ascii_case(UNSET_SENTINEL) => Override::Unset,
        Some(s) => Override::Set(s),
    }
}

fn parse_fid(raw: &str) -> Option<u8> {
    raw.trim()
        .parse::<u8>()
        .ok()
        .filter(|fid| (FID_MIN..=FID_MAX).contains(fid))
}

fn parse_did(raw: &str) -> Option<u8> {
    raw.trim()
        .parse::<u8>()
        .ok()
        .filter(|did| (DID_MIN..=DID_MAX).contains(did))
}

/// Parses a target FID or inclusive range, e.g. `7` or `3-5`.
fn parse_fid_range(spec: &str) -> Result<Vec<u8>, String> {
    let spec = spec.trim();
    let error = || format!("Target FID '{spec}' must be an integer or range in {FID_MIN}-{FID_MAX}");

    if let Some((low, high)) = spec.split_once('-') {
        let low = parse_fid(low).ok_or_else(error)?;
        let high = parse_fid(high).ok_or_else(error)?;
        if low > high {
            return Err(error());
        }
        Ok((low..=high).collect())
    } else {
        parse_fid(spec).map(|fid| vec![fid]).ok_or_else(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SwitchRecord, resources};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn reference_chassis() -> ChassisRecord {
        let mut chassis = ChassisRecord {
            wwn: String::from("10:00:00:00:00:00:00:aa"),
            ..ChassisRecord::default()
        };
        for (fid, name, did) in [(1u8, "core_1", 3u8), (20, "edge_20", 20)] {
            let mut switch = SwitchRecord {
                fid,
                ..SwitchRecord::default()
            };
            switch.attributes.insert(
                resources::FC_SWITCH.to_string(),
                BTreeMap::from([
                    (String::from("user-friendly-name"), json!(name)),
                    (String::from("fabric-user-friendly-name"), json!("fab_prod")),
                    (String::from("domain-id"), json!(did)),
                ]),
            );
            chassis.switches.insert(fid, switch);
        }
        chassis
    }

    fn rule(reference: &str) -> MappingRule {
        MappingRule {
            reference: String::from(reference),
            ..MappingRule::default()
        }
    }

    #[test]
    fn test_empty_rules_default_to_identity_mapping() {
        let chassis = reference_chassis();
        let (map, diagnostics) = IdentityMap::build(&chassis, &[]);

        assert!(diagnostics.is_empty());
        assert_eq!(map.len(), 2);
        let entry = map.get(1).expect("FID 1 should be mapped");
        assert_eq!(entry.reference_fid, 1);
        assert_eq!(entry.domain_id, Some(3));
        assert_eq!(entry.switch_name.as_deref(), Some("core_1"));
        assert_eq!(entry.fabric_name.as_deref(), Some("fab_prod"));
    }

    #[test]
    fn test_range_expansion_shares_reference() {
        let chassis = reference_chassis();
        let mut fan_out = rule("1");
        fan_out.target = Some(String::from("3-5"));

        let (map, diagnostics) = IdentityMap::build(&chassis, &[fan_out]);

        assert!(diagnostics.is_empty());
        assert_eq!(map.len(), 3);
        for fid in 3..=5 {
            let entry = map.get(fid).expect("range FID should be mapped");
            assert_eq!(entry.reference_fid, 1);
            assert_eq!(entry.target_fid, fid);
        }
    }

    #[test]
    fn test_unresolvable_reference_dropped_and_processing_continues() {
        let chassis = reference_chassis();
        let (map, diagnostics) = IdentityMap::build(&chassis, &[rule("99"), rule("20")]);

        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("does not exist"));
        assert_eq!(map.len(), 1);
        assert!(map.get(20).is_some());
    }

    #[test]
    fn test_out_of_range_domain_id_drops_the_rule() {
        let chassis = reference_chassis();
        let mut bad = rule("1");
        bad.domain_id = Some(String::from("300"));

        let (map, diagnostics) = IdentityMap::build(&chassis, &[bad]);

        assert!(map.is_empty());
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("1-239"));
    }

    #[test]
    fn test_non_numeric_fid_drops_the_rule() {
        let chassis = reference_chassis();
        let mut bad = rule("1");
        bad.target = Some(String::from("seven"));

        let (map, diagnostics) = IdentityMap::build(&chassis, &[bad]);

        assert!(map.is_empty());
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_none_sentinel_suppresses_field() {
        let chassis = reference_chassis();
        let mut suppressed = rule("1");
        suppressed.fabric_name = Some(String::from("None"));
        suppressed.switch_name = Some(String::from("sw_custom"));

        let (map, diagnostics) = IdentityMap::build(&chassis, &[suppressed]);

        assert!(diagnostics.is_empty());
        let entry = map.get(1).expect("FID 1 should be mapped");
        assert_eq!(entry.fabric_name, None);
        assert_eq!(entry.switch_name.as_deref(), Some("sw_custom"));
        // Untouched override still inherits.
        assert_eq!(entry.domain_id, Some(3));
    }

    #[test]
    fn test_duplicate_target_keeps_last_with_diagnostic() {
        let chassis = reference_chassis();
        let mut second = rule("20");
        second.target = Some(String::from("1"));

        let (map, diagnostics) = IdentityMap::build(&chassis, &[rule("1"), second]);

        assert_eq!(map.len(), 1);
        assert_eq!(
            map.get(1).expect("FID 1 should be mapped").reference_fid,
            20
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("already mapped"));
    }

    #[test]
    fn test_descending_range_rejected() {
        assert!(parse_fid_range("5-3").is_err());
        assert_eq!(parse_fid_range("3-5").expect("valid range"), vec![3, 4, 5]);
        assert_eq!(parse_fid_range("7").expect("single FID"), vec![7]);
    }
}
