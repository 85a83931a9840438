//! State capture: batched reads assembling the target state tree.
//!
//! Capture issues one GET per resource path — chassis-level resources
//! first, then each per-switch resource for every logical switch found —
//! and assembles the responses into a [`TargetState`]. An
//! application-level failure on one resource records a partial-data
//! marker and capture continues; a transport-level failure anywhere is
//! fatal for the whole batch.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::CaptureError;
use crate::fos::{Method, Transport};
use crate::model::{
    Attributes, ChassisRecord, SwitchRecord, TargetState, ZoneDb, fid_path, resources,
};

/// The resource paths one capture reads.
#[derive(Debug, Clone)]
pub struct CapturePlan {
    /// Chassis-level resources, read once.
    pub chassis_resources: Vec<String>,
    /// Per-switch resources, read once per discovered fabric ID.
    pub switch_resources: Vec<String>,
}

impl CapturePlan {
    /// The minimal plan: chassis settings, the logical-switch inventory,
    /// and per-switch identification.
    #[must_use]
    pub fn base() -> Self {
        Self {
            chassis_resources: vec![
                resources::CHASSIS.to_string(),
                resources::LOGICAL_SWITCH.to_string(),
            ],
            switch_resources: vec![resources::FC_SWITCH.to_string()],
        }
    }

    /// Adds a chassis-level resource if not already present.
    pub fn add_chassis_resource(&mut self, resource: &str) {
        if !self.chassis_resources.iter().any(|r| r == resource) {
            self.chassis_resources.push(resource.to_string());
        }
    }

    /// Adds a per-switch resource if not already present.
    pub fn add_switch_resource(&mut self, resource: &str) {
        if !self.switch_resources.iter().any(|r| r == resource) {
            self.switch_resources.push(resource.to_string());
        }
    }
}

/// Captures the target state tree.
///
/// # Errors
///
/// Returns [`CaptureError::BatchFailed`] when any read fails at the
/// transport level; application-level read failures become partial-data
/// markers instead.
pub async fn capture<T: Transport>(
    transport: &T,
    plan: &CapturePlan,
) -> Result<TargetState, CaptureError> {
    let mut state = TargetState::default();

    for resource in &plan.chassis_resources {
        let Some(payload) = read(transport, resource, &mut state).await? else {
            continue;
        };
        match resource.as_str() {
            resources::LOGICAL_SWITCH => assemble_switches(&mut state.chassis, &payload),
            resources::USER_CONFIG => {
                state.chassis.users = attribute_list(&payload);
            }
            _ => {
                state
                    .chassis
                    .attributes
                    .insert(resource.clone(), attribute_bag(&payload));
            }
        }
    }

    let wwn = state
        .chassis
        .attr(resources::CHASSIS, "chassis-wwn")
        .and_then(Value::as_str)
        .map(String::from);
    if let Some(wwn) = wwn {
        state.chassis.wwn = wwn;
    }

    let fids: Vec<u8> = state.chassis.fids();
    for fid in fids {
        for resource in &plan.switch_resources {
            let path = fid_path(resource, fid);
            let Some(payload) = read(transport, &path, &mut state).await? else {
                continue;
            };
            let Some(switch) = state.chassis.switches.get_mut(&fid) else {
                continue;
            };
            match resource.as_str() {
                resources::FC_PORTS => {
                    switch.ports = port_map(&payload);
                }
                resources::ZONING_DEFINED => {
                    let effective = switch.zoning.take().and_then(|z| z.effective);
                    let mut zoning = ZoneDb::from_defined_payload(&payload);
                    zoning.effective = effective;
                    switch.zoning = Some(zoning);
                }
                resources::ZONING_EFFECTIVE => {
                    let effective = payload
                        .get("effective-configuration")
                        .unwrap_or(&payload)
                        .get("cfg-name")
                        .and_then(Value::as_str)
                        .map(String::from);
                    switch.zoning.get_or_insert_with(ZoneDb::default).effective = effective;
                }
                resources::MAPS_RULE => {
                    switch.maps_rules = attribute_list(&payload);
                }
                resources::MAPS_POLICY => {
                    switch.maps_active_policy = payload
                        .get("name")
                        .and_then(Value::as_str)
                        .map(String::from);
                }
                _ => {
                    switch
                        .attributes
                        .insert(resource.clone(), attribute_bag(&payload));
                }
            }
        }
    }

    debug!(
        "Captured target state: {} logical switches, {} partial resources",
        state.chassis.switches.len(),
        state.partial.len()
    );

    Ok(state)
}

/// Issues one read, recording application-level failures as partial data.
async fn read<T: Transport>(
    transport: &T,
    path: &str,
    state: &mut TargetState,
) -> Result<Option<Value>, CaptureError> {
    match transport.request(Method::Get, path, None).await {
        Ok(payload) => Ok(Some(payload)),
        Err(e) if e.is_application_level() => {
            warn!("Partial capture: {path}: {e}");
            state.partial.insert(path.to_string());
            Ok(None)
        }
        Err(e) => Err(CaptureError::BatchFailed {
            resource: path.to_string(),
            message: e.to_string(),
        }),
    }
}

/// Builds switch records from the logical-switch inventory payload.
fn assemble_switches(chassis: &mut ChassisRecord, payload: &Value) {
    for entry in payload.as_array().into_iter().flatten() {
        let Some(fid) = entry
            .get("fabric-id")
            .and_then(Value::as_u64)
            .and_then(|v| u8::try_from(v).ok())
        else {
            continue;
        };
        let flag = |name: &str| entry.get(name).and_then(Value::as_bool).unwrap_or(false);
        chassis.switches.insert(
            fid,
            SwitchRecord {
                fid,
                default_switch: flag("default-switch"),
                base_switch: flag("base-switch"),
                ficon_switch: flag("ficon-switch"),
                ..SwitchRecord::default()
            },
        );
    }
}

/// Converts an object payload into an attribute bag.
fn attribute_bag(payload: &Value) -> Attributes {
    payload
        .as_object()
        .map(|obj| obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default()
}

/// Converts an array payload into a list of attribute bags.
fn attribute_list(payload: &Value) -> Vec<Attributes> {
    payload
        .as_array()
        .map(|entries| entries.iter().map(attribute_bag).collect())
        .unwrap_or_default()
}

/// Converts a port array payload into a name-keyed map of attribute bags.
fn port_map(payload: &Value) -> std::collections::BTreeMap<String, Attributes> {
    payload
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|entry| {
            entry
                .get("name")
                .and_then(Value::as_str)
                .map(|name| (name.to_string(), attribute_bag(entry)))
        })
        .collect()
}
