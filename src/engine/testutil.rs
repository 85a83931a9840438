//! In-memory fake chassis for pipeline tests.
//!
//! Implements the [`Transport`] contract against a mutable
//! [`ChassisRecord`], so the full pipeline — capture, diff, write,
//! re-capture — can be exercised end-to-end without a device. Every
//! non-GET request is recorded so tests can assert on the writes a run
//! issued.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use crate::error::TransportError;
use crate::fos::{Method, Transport};
use crate::model::{Attributes, ChassisRecord, SwitchRecord, ZoneDb, resources};

/// A fake chassis behind the transport contract.
pub struct FakeFabric {
    state: Mutex<ChassisRecord>,
    writes: Mutex<Vec<(Method, String)>>,
    fail_switch_patch_fids: BTreeSet<u8>,
}

impl FakeFabric {
    /// Creates a fake chassis with the given initial state.
    pub fn new(initial: ChassisRecord) -> Self {
        Self {
            state: Mutex::new(initial),
            writes: Mutex::new(Vec::new()),
            fail_switch_patch_fids: BTreeSet::new(),
        }
    }

    /// Makes switch-settings patches fail for the given FIDs.
    pub fn fail_switch_patches(mut self, fids: impl IntoIterator<Item = u8>) -> Self {
        self.fail_switch_patch_fids = fids.into_iter().collect();
        self
    }

    /// All non-GET requests issued so far.
    pub fn writes(&self) -> Vec<(Method, String)> {
        self.writes.lock().expect("writes lock").clone()
    }

    /// Number of non-GET requests issued so far.
    pub fn write_count(&self) -> usize {
        self.writes.lock().expect("writes lock").len()
    }

    /// Snapshot of the fake device state.
    pub fn state(&self) -> ChassisRecord {
        self.state.lock().expect("state lock").clone()
    }

    fn get(&self, resource: &str, fid: Option<u8>) -> Result<Value, TransportError> {
        let state = self.state.lock().expect("state lock");
        match (resource, fid) {
            (resources::CHASSIS, None) => Ok(bag_to_value(
                state.attributes.get(resources::CHASSIS),
            )),
            (resources::USER_CONFIG, None) => Ok(Value::Array(
                state.users.iter().map(|u| bag_to_value(Some(u))).collect(),
            )),
            (resources::LOGICAL_SWITCH, None) => Ok(Value::Array(
                state
                    .switches
                    .values()
                    .map(|s| {
                        json!({
                            "fabric-id": s.fid,
                            "default-switch": s.default_switch,
                            "base-switch": s.base_switch,
                            "ficon-switch": s.ficon_switch,
                        })
                    })
                    .collect(),
            )),
            (
                resources::FC_SWITCH | resources::SWITCH_CONFIG | resources::PORT_CONFIG,
                Some(fid),
            ) => {
                let switch = lookup(&state, fid)?;
                Ok(bag_to_value(switch.attributes.get(resource)))
            }
            (resources::FC_PORTS, Some(fid)) => {
                let switch = lookup(&state, fid)?;
                Ok(Value::Array(
                    switch
                        .ports
                        .iter()
                        .map(|(name, attrs)| {
                            let mut bag = bag_to_value(Some(attrs));
                            bag["name"] = json!(name);
                            bag
                        })
                        .collect(),
                ))
            }
            (resources::ZONING_DEFINED, Some(fid)) => {
                let switch = lookup(&state, fid)?;
                Ok(switch
                    .zoning
                    .as_ref()
                    .map_or_else(|| ZoneDb::default().to_defined_payload(), ZoneDb::to_defined_payload))
            }
            (resources::ZONING_EFFECTIVE, Some(fid)) => {
                let switch = lookup(&state, fid)?;
                let effective = switch.zoning.as_ref().and_then(|z| z.effective.as_ref());
                Ok(match effective {
                    Some(cfg) => json!({"effective-configuration": {"cfg-name": cfg}}),
                    None => json!({"effective-configuration": {}}),
                })
            }
            (resources::MAPS_RULE, Some(fid)) => {
                let switch = lookup(&state, fid)?;
                Ok(Value::Array(
                    switch
                        .maps_rules
                        .iter()
                        .map(|r| bag_to_value(Some(r)))
                        .collect(),
                ))
            }
            (resources::MAPS_POLICY, Some(fid)) => {
                let switch = lookup(&state, fid)?;
                Ok(switch
                    .maps_active_policy
                    .as_ref()
                    .map_or_else(|| json!({}), |p| json!({"name": p})))
            }
            _ => Err(TransportError::api(404, format!("no such resource: {resource}"))),
        }
    }

    fn mutate(
        &self,
        method: Method,
        resource: &str,
        fid: Option<u8>,
        body: Option<Value>,
    ) -> Result<Value, TransportError> {
        let mut state = self.state.lock().expect("state lock");
        let body = body.unwrap_or(Value::Null);

        match (method, resource, fid) {
            (Method::Patch, resources::CHASSIS, None) => {
                merge(
                    state
                        .attributes
                        .entry(resources::CHASSIS.to_string())
                        .or_default(),
                    &body,
                );
                Ok(Value::Null)
            }
            (Method::Post, resources::LOGICAL_SWITCH, None) => {
                let fid = required_fid(&body)?;
                let flag = |name: &str| body.get(name).and_then(Value::as_bool).unwrap_or(false);
                let mut switch = SwitchRecord {
                    fid,
                    base_switch: flag("base-switch"),
                    ficon_switch: flag("ficon-switch"),
                    ..SwitchRecord::default()
                };
                switch.attributes.insert(
                    resources::FC_SWITCH.to_string(),
                    BTreeMap::from([(String::from("enabled-state"), json!(false))]),
                );
                state.switches.insert(fid, switch);
                Ok(Value::Null)
            }
            (Method::Delete, resources::LOGICAL_SWITCH, None) => {
                let fid = required_fid(&body)?;
                state
                    .switches
                    .remove(&fid)
                    .map(|_| Value::Null)
                    .ok_or_else(|| TransportError::api(404, format!("no such FID: {fid}")))
            }
            (Method::Post, resources::LOGICAL_SWITCH_PORT_MEMBERS, None) => {
                let fid = required_fid(&body)?;
                if !state.switches.contains_key(&fid) {
                    return Err(TransportError::api(404, format!("no such FID: {fid}")));
                }
                let ports: Vec<String> = body
                    .get("ports")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect();
                for port in ports {
                    let attrs = state
                        .switches
                        .values_mut()
                        .find_map(|s| s.ports.remove(&port));
                    if let Some(attrs) = attrs {
                        if let Some(switch) = state.switches.get_mut(&fid) {
                            switch.ports.insert(port, attrs);
                        }
                    }
                }
                Ok(Value::Null)
            }
            (Method::Post, resources::USER_CONFIG, None) => {
                for bag in body.as_array().into_iter().flatten() {
                    state.users.push(value_to_bag(bag));
                }
                Ok(Value::Null)
            }
            (Method::Patch, resources::FC_SWITCH, Some(fid)) => {
                if self.fail_switch_patch_fids.contains(&fid) {
                    return Err(TransportError::api(500, "simulated switch failure"));
                }
                let switch = lookup_mut(&mut state, fid)?;
                merge(
                    switch
                        .attributes
                        .entry(resources::FC_SWITCH.to_string())
                        .or_default(),
                    &body,
                );
                Ok(Value::Null)
            }
            (
                Method::Patch,
                resources::SWITCH_CONFIG | resources::PORT_CONFIG,
                Some(fid),
            ) => {
                let switch = lookup_mut(&mut state, fid)?;
                merge(
                    switch.attributes.entry(resource.to_string()).or_default(),
                    &body,
                );
                Ok(Value::Null)
            }
            (Method::Patch, resources::FC_PORTS, Some(fid)) => {
                let switch = lookup_mut(&mut state, fid)?;
                for entry in body.as_array().into_iter().flatten() {
                    let Some(name) = entry.get("name").and_then(Value::as_str) else {
                        continue;
                    };
                    let Some(attrs) = switch.ports.get_mut(name) else {
                        return Err(TransportError::api(404, format!("no such port: {name}")));
                    };
                    let mut patch = value_to_bag(entry);
                    patch.remove("name");
                    for (k, v) in patch {
                        attrs.insert(k, v);
                    }
                }
                Ok(Value::Null)
            }
            (Method::Post, resources::ZONING_DEFINED, Some(fid)) => {
                let switch = lookup_mut(&mut state, fid)?;
                let effective = switch.zoning.as_ref().and_then(|z| z.effective.clone());
                let mut zoning = ZoneDb::from_defined_payload(&body);
                zoning.effective = effective;
                switch.zoning = Some(zoning);
                Ok(Value::Null)
            }
            (Method::Patch, resources::ZONING_EFFECTIVE, Some(fid)) => {
                let switch = lookup_mut(&mut state, fid)?;
                let cfg = body.get("cfg-name").and_then(Value::as_str).map(String::from);
                switch.zoning.get_or_insert_with(ZoneDb::default).effective = cfg;
                Ok(Value::Null)
            }
            (Method::Post, resources::MAPS_RULE, Some(fid)) => {
                let switch = lookup_mut(&mut state, fid)?;
                for bag in body.as_array().into_iter().flatten() {
                    switch.maps_rules.push(value_to_bag(bag));
                }
                Ok(Value::Null)
            }
            (Method::Patch, resources::MAPS_POLICY, Some(fid)) => {
                let switch = lookup_mut(&mut state, fid)?;
                switch.maps_active_policy =
                    body.get("name").and_then(Value::as_str).map(String::from);
                Ok(Value::Null)
            }
            (Method::Post, resources::CLI_COMMAND, None) => Ok(json!({"status": "ok"})),
            _ => Err(TransportError::api(
                405,
                format!("unsupported: {method} {resource}"),
            )),
        }
    }
}

#[async_trait]
impl Transport for FakeFabric {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, TransportError> {
        let (resource, fid) = split_path(path);
        if method == Method::Get {
            return self.get(resource, fid);
        }
        self.writes
            .lock()
            .expect("writes lock")
            .push((method, path.to_string()));
        self.mutate(method, resource, fid, body)
    }
}

fn split_path(path: &str) -> (&str, Option<u8>) {
    path.split_once("?fid=").map_or((path, None), |(resource, fid)| {
        (resource, fid.parse().ok())
    })
}

fn lookup<'a>(
    state: &'a ChassisRecord,
    fid: u8,
) -> Result<&'a SwitchRecord, TransportError> {
    state
        .switches
        .get(&fid)
        .ok_or_else(|| TransportError::api(404, format!("no such FID: {fid}")))
}

fn lookup_mut<'a>(
    state: &'a mut ChassisRecord,
    fid: u8,
) -> Result<&'a mut SwitchRecord, TransportError> {
    state
        .switches
        .get_mut(&fid)
        .ok_or_else(|| TransportError::api(404, format!("no such FID: {fid}")))
}

fn required_fid(body: &Value) -> Result<u8, TransportError> {
    body.get("fabric-id")
        .and_then(Value::as_u64)
        .and_then(|v| u8::try_from(v).ok())
        .ok_or_else(|| TransportError::api(400, "missing fabric-id"))
}

fn bag_to_value(bag: Option<&Attributes>) -> Value {
    bag.map_or_else(
        || json!({}),
        |bag| Value::Object(bag.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
    )
}

fn value_to_bag(value: &Value) -> Attributes {
    value
        .as_object()
        .map(|obj| obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default()
}

fn merge(bag: &mut Attributes, patch: &Value) {
    if let Some(obj) = patch.as_object() {
        for (k, v) in obj {
            bag.insert(k.clone(), v.clone());
        }
    }
}

/// Builds the attribute bag of a switch's identification resource.
pub fn fc_switch_attrs(name: &str, domain: u8, enabled: bool) -> Attributes {
    BTreeMap::from([
        (String::from("user-friendly-name"), json!(name)),
        (String::from("domain-id"), json!(domain)),
        (String::from("enabled-state"), json!(enabled)),
    ])
}

/// Builds a port attribute bag.
pub fn port_attrs(speed: u64, enabled: bool) -> Attributes {
    BTreeMap::from([
        (String::from("speed"), json!(speed)),
        (String::from("enabled-state"), json!(enabled)),
    ])
}

/// A target chassis holding only its default logical switch and the
/// given ports, all disabled, virtual fabrics on.
pub fn target_with_default_switch(ports: &[&str]) -> ChassisRecord {
    let mut chassis = ChassisRecord {
        wwn: String::from("10:00:00:00:00:00:0t:01"),
        ..ChassisRecord::default()
    };
    chassis.attributes.insert(
        resources::CHASSIS.to_string(),
        BTreeMap::from([
            (String::from("chassis-wwn"), json!(chassis.wwn)),
            (String::from("vf-enabled"), json!(true)),
            (String::from("chassis-enabled"), json!(true)),
        ]),
    );
    let mut default_switch = SwitchRecord {
        fid: 128,
        default_switch: true,
        ..SwitchRecord::default()
    };
    default_switch.attributes.insert(
        resources::FC_SWITCH.to_string(),
        fc_switch_attrs("default_switch", 1, true),
    );
    for port in ports {
        default_switch
            .ports
            .insert(String::from(*port), port_attrs(8, false));
    }
    chassis.switches.insert(128, default_switch);
    chassis
}

/// A reference chassis with one logical switch (FID 1, domain 3, name
/// "A"), two enabled 16G ports, zoning, a MAPS rule, and one user.
pub fn reference_chassis() -> ChassisRecord {
    let mut chassis = ChassisRecord {
        wwn: String::from("10:00:00:00:00:00:0r:01"),
        ..ChassisRecord::default()
    };
    chassis.attributes.insert(
        resources::CHASSIS.to_string(),
        BTreeMap::from([
            (String::from("chassis-wwn"), json!(chassis.wwn)),
            (String::from("chassis-user-friendly-name"), json!("chassis_a")),
            (String::from("vf-enabled"), json!(true)),
        ]),
    );
    chassis.users.push(BTreeMap::from([
        (String::from("name"), json!("operator")),
        (String::from("account-description"), json!("SAN operator")),
        (String::from("account-enabled"), json!(true)),
    ]));

    let mut switch = SwitchRecord {
        fid: 1,
        ..SwitchRecord::default()
    };
    switch.attributes.insert(
        resources::FC_SWITCH.to_string(),
        fc_switch_attrs("A", 3, true),
    );
    switch.ports.insert(String::from("0/1"), port_attrs(16, true));
    switch.ports.insert(String::from("0/2"), port_attrs(16, true));

    let mut zoning = ZoneDb::default();
    zoning
        .aliases
        .insert(String::from("host_a"), vec![String::from("10:00:01")]);
    zoning.zones.insert(
        String::from("z_prod"),
        crate::model::Zone {
            members: vec![String::from("host_a")],
            ..crate::model::Zone::default()
        },
    );
    zoning
        .configs
        .insert(String::from("cfg_main"), vec![String::from("z_prod")]);
    zoning.effective = Some(String::from("cfg_main"));
    switch.zoning = Some(zoning);

    switch
        .maps_rules
        .push(BTreeMap::from([(String::from("name"), json!("rule_crc"))]));
    switch.maps_active_policy = Some(String::from("policy_strict"));

    chassis.switches.insert(1, switch);
    chassis
}
