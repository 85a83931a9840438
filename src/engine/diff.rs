//! Diff evaluator for attribute bags and membership lists.
//!
//! Two comparison modes exist. Scalar attribute comparison is exact-value
//! under a whitelist: only whitelisted attributes are ever inspected, and
//! an absent or null reference value never proposes a change — the
//! reference's silence is never read as "clear this field". Membership
//! comparison, used for zoning, is order-insensitive set comparison.

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::model::Attributes;

/// The minimal attribute set that differs, with the reference's value as
/// the proposed new value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: BTreeMap<String, Value>,
}

/// Result of an order-insensitive membership comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipDelta {
    /// Members present in the reference but not the target.
    pub added: Vec<String>,
    /// Members present in the target but not the reference.
    pub removed: Vec<String>,
}

impl ChangeSet {
    /// Returns true if nothing differs.
    ///
    /// Callers must treat an empty set as "issue no write".
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of differing attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Returns the proposed value for an attribute, if it differs.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.changes.get(name)
    }

    /// Removes an attribute from the proposed changes.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.changes.remove(name)
    }

    /// Names of the differing attributes, ascending.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.changes.keys().map(String::as_str)
    }

    /// Iterates the differing attributes and their proposed values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.changes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Renders the change set as a JSON object for a write body.
    #[must_use]
    pub fn to_payload(&self) -> Value {
        Value::Object(
            self.changes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

impl MembershipDelta {
    /// Returns true if the two membership lists hold the same members.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Compares whitelisted attributes of a reference bag against a target
/// bag.
///
/// An attribute is proposed for change when the reference value is
/// present (non-null) and differs from the target value by value or by
/// JSON type, including when the target has no value at all. Attributes
/// outside the whitelist are never inspected, so target-only fields are
/// never clobbered.
#[must_use]
pub fn diff_attributes(
    reference: &Attributes,
    target: &Attributes,
    whitelist: &[&str],
) -> ChangeSet {
    let mut changes = BTreeMap::new();

    for &name in whitelist {
        let Some(r_val) = reference.get(name) else {
            continue;
        };
        if r_val.is_null() {
            continue;
        }

        let differs = match target.get(name) {
            None => true,
            Some(t_val) => !same_type(r_val, t_val) || r_val != t_val,
        };
        if differs {
            changes.insert(name.to_string(), r_val.clone());
        }
    }

    ChangeSet { changes }
}

/// Compares two membership lists order-insensitively.
///
/// Duplicates within a list are collapsed; only set membership matters.
#[must_use]
pub fn diff_membership<S: AsRef<str>>(reference: &[S], target: &[S]) -> MembershipDelta {
    let r_set: BTreeSet<&str> = reference.iter().map(AsRef::as_ref).collect();
    let t_set: BTreeSet<&str> = target.iter().map(AsRef::as_ref).collect();

    MembershipDelta {
        added: r_set.difference(&t_set).map(|s| String::from(*s)).collect(),
        removed: t_set.difference(&r_set).map(|s| String::from(*s)).collect(),
    }
}

/// True if two JSON values share a type discriminant.
const fn same_type(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::Null, Value::Null)
            | (Value::Bool(_), Value::Bool(_))
            | (Value::Number(_), Value::Number(_))
            | (Value::String(_), Value::String(_))
            | (Value::Array(_), Value::Array(_))
            | (Value::Object(_), Value::Object(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(pairs: &[(&str, Value)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (String::from(*k), v.clone()))
            .collect()
    }

    #[test]
    fn test_converged_bags_produce_empty_set() {
        let reference = bag(&[("banner", json!("welcome")), ("edge-hold-time", json!(220))]);
        let target = reference.clone();

        let changes = diff_attributes(&reference, &target, &["banner", "edge-hold-time"]);
        assert!(changes.is_empty());
    }

    #[test]
    fn test_differing_value_proposes_reference_value() {
        let reference = bag(&[("banner", json!("welcome"))]);
        let target = bag(&[("banner", json!("old banner"))]);

        let changes = diff_attributes(&reference, &target, &["banner"]);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes.get("banner"), Some(&json!("welcome")));
    }

    #[test]
    fn test_type_difference_is_a_change() {
        let reference = bag(&[("edge-hold-time", json!(220))]);
        let target = bag(&[("edge-hold-time", json!("220"))]);

        let changes = diff_attributes(&reference, &target, &["edge-hold-time"]);
        assert_eq!(changes.get("edge-hold-time"), Some(&json!(220)));
    }

    #[test]
    fn test_absent_reference_is_noop() {
        // Reference missing the field, target has a value: leave alone.
        let reference = bag(&[]);
        let target = bag(&[("banner", json!("foo"))]);

        let changes = diff_attributes(&reference, &target, &["banner"]);
        assert!(changes.is_empty());
    }

    #[test]
    fn test_null_reference_is_noop() {
        let reference = bag(&[("banner", Value::Null)]);
        let target = bag(&[("banner", json!("foo"))]);

        let changes = diff_attributes(&reference, &target, &["banner"]);
        assert!(changes.is_empty());
    }

    #[test]
    fn test_target_missing_value_is_a_change() {
        let reference = bag(&[("banner", json!("welcome"))]);
        let target = bag(&[]);

        let changes = diff_attributes(&reference, &target, &["banner"]);
        assert_eq!(changes.get("banner"), Some(&json!("welcome")));
    }

    #[test]
    fn test_whitelist_isolation() {
        // A differing attribute outside the whitelist never appears,
        // regardless of the reference value.
        let reference = bag(&[("banner", json!("a")), ("secret-knob", json!(1))]);
        let target = bag(&[("banner", json!("a")), ("secret-knob", json!(2))]);

        let changes = diff_attributes(&reference, &target, &["banner"]);
        assert!(changes.is_empty());
    }

    #[test]
    fn test_payload_shape() {
        let reference = bag(&[("banner", json!("welcome")), ("domain-id", json!(3))]);
        let target = bag(&[]);

        let changes = diff_attributes(&reference, &target, &["banner", "domain-id"]);
        assert_eq!(
            changes.to_payload(),
            json!({"banner": "welcome", "domain-id": 3})
        );
    }

    #[test]
    fn test_membership_order_insensitive() {
        let delta = diff_membership(&["a", "b"], &["b", "a"]);
        assert!(delta.is_unchanged());
    }

    #[test]
    fn test_membership_removal_detected() {
        let delta = diff_membership(&["a"], &["a", "b"]);
        assert!(delta.added.is_empty());
        assert_eq!(delta.removed, vec![String::from("b")]);
    }

    #[test]
    fn test_membership_addition_detected() {
        let delta = diff_membership(&["a", "b"], &["a"]);
        assert_eq!(delta.added, vec![String::from("b")]);
        assert!(delta.removed.is_empty());
    }
}
