//! Action handlers: the comparison-and-write bodies dispatched by the
//! pipeline runner.
//!
//! Every handler follows the same discipline: read the reference and the
//! captured target, compute the minimal difference, and issue writes only
//! for what differs. Per-scope failures are recorded on the affected
//! outcome record and the handler moves on to the next scope; only a
//! failure that prevents the whole action from proceeding surfaces as a
//! structural error.

use serde_json::{Value, json};
use tracing::debug;

use crate::error::{ActionError, RestoreError};
use crate::fos::{Method, Transport};
use crate::model::{Attributes, ZoneDb, fid_path, resources};

use super::diff::{diff_attributes, diff_membership};
use super::pipeline::Pipeline;

/// Temporary password assigned to re-created user accounts.
///
/// Holders must change it at first login; the report lists every account
/// created with it.
pub const DEFAULT_USER_PASSWORD: &str = "Passw0rd!";

/// Port settings the management API cannot express; restored through the
/// device's CLI channel instead.
pub const CLI_PORT_SETTINGS: &[&str] = &["locked-e-port", "long-distance", "isl-ready-mode"];

/// User accounts never re-created on the target.
const RESERVED_USERS: &[&str] = &["root"];

impl<T: Transport> Pipeline<'_, T> {
    /// Enables virtual fabrics when the reference has them and the target
    /// does not.
    ///
    /// The mode can only change on a disabled chassis, so this is a
    /// three-step sequence — disable, patch, re-enable — that no other
    /// action may interrupt.
    pub(super) async fn enable_virtual_fabrics(&mut self) -> Result<(), RestoreError> {
        let transport = self.transport;
        let empty = Attributes::new();
        let reference = self
            .reference
            .attributes
            .get(resources::CHASSIS)
            .unwrap_or(&empty);
        let target = self
            .target
            .chassis
            .attributes
            .get(resources::CHASSIS)
            .unwrap_or(&empty);

        let changes = diff_attributes(reference, target, super::action::VF_SETTINGS);
        if changes.is_empty() {
            debug!("Virtual-fabrics mode already matches");
            return Ok(());
        }

        if let Err(e) = transport
            .request(
                Method::Patch,
                resources::CHASSIS,
                Some(json!({"chassis-enabled": false})),
            )
            .await
        {
            self.chassis_diagnostic(format!("Failed to disable chassis: {e}"));
            return Ok(());
        }

        match transport
            .request(Method::Patch, resources::CHASSIS, Some(changes.to_payload()))
            .await
        {
            Ok(_) => {
                let label = self.reference.label().to_string();
                self.records.chassis(&label).vf_enabled = true;
            }
            Err(e) => {
                self.chassis_diagnostic(format!("Failed to set virtual-fabrics mode: {e}"));
            }
        }

        // Re-enable unconditionally; the chassis was enabled when we
        // started or the disable above would have failed.
        if let Err(e) = transport
            .request(
                Method::Patch,
                resources::CHASSIS,
                Some(json!({"chassis-enabled": true})),
            )
            .await
        {
            self.chassis_diagnostic(format!("Failed to re-enable chassis: {e}"));
        }

        Ok(())
    }

    /// Deletes non-default logical switches with no identity-map entry.
    ///
    /// Switches the map will create or adopt are left in place, so a
    /// converged target sees no deletions.
    pub(super) async fn clear_logical_switches(&mut self) -> Result<(), RestoreError> {
        let transport = self.transport;
        let doomed: Vec<(u8, String)> = self
            .target
            .chassis
            .switches
            .values()
            .filter(|s| !s.default_switch && self.identity.get(s.fid).is_none())
            .map(|s| (s.fid, s.label()))
            .collect();

        for (fid, label) in doomed {
            match transport
                .request(
                    Method::Delete,
                    resources::LOGICAL_SWITCH,
                    Some(json!({"fabric-id": fid})),
                )
                .await
            {
                Ok(_) => {
                    self.records.switch(fid, &label).removed = true;
                }
                Err(e) => {
                    self.switch_diagnostic(fid, &label, format!("Failed to delete switch: {e}"));
                }
            }
        }

        Ok(())
    }

    /// Creates logical switches missing on the target, then applies the
    /// identity-map overrides for the domain ID and names.
    pub(super) async fn create_logical_switches(&mut self) -> Result<(), RestoreError> {
        let transport = self.transport;

        for entry in self.identity_entries() {
            if self.target.switch(entry.target_fid).is_some() {
                continue;
            }
            let Some(reference_switch) = self.reference.switch(entry.reference_fid) else {
                continue;
            };
            let label = self.entry_label(&entry);

            let body = json!({
                "fabric-id": entry.target_fid,
                "base-switch": reference_switch.base_switch,
                "ficon-switch": reference_switch.ficon_switch,
            });
            match transport
                .request(Method::Post, resources::LOGICAL_SWITCH, Some(body))
                .await
            {
                Ok(_) => {
                    self.records.switch(entry.target_fid, &label).created = true;
                }
                Err(e) => {
                    self.switch_diagnostic(
                        entry.target_fid,
                        &label,
                        format!("Failed to create switch: {e}"),
                    );
                    continue;
                }
            }

            let mut overrides = serde_json::Map::new();
            if let Some(did) = entry.domain_id {
                overrides.insert(String::from("domain-id"), json!(did));
            }
            if let Some(name) = &entry.switch_name {
                overrides.insert(String::from("user-friendly-name"), json!(name));
            }
            if let Some(name) = &entry.fabric_name {
                overrides.insert(String::from("fabric-user-friendly-name"), json!(name));
            }
            if overrides.is_empty() {
                continue;
            }

            if let Err(e) = transport
                .request(
                    Method::Patch,
                    &fid_path(resources::FC_SWITCH, entry.target_fid),
                    Some(Value::Object(overrides)),
                )
                .await
            {
                self.switch_diagnostic(
                    entry.target_fid,
                    &label,
                    format!("Failed to set domain ID and names: {e}"),
                );
            }
        }

        Ok(())
    }

    /// Moves ports from their current owner into the mapped switch.
    ///
    /// Ports the target chassis does not have are ignored; ports already
    /// in place are left alone.
    pub(super) async fn move_ports(&mut self) -> Result<(), RestoreError> {
        if self.target.chassis.switches.is_empty() {
            return Err(ActionError::structural(
                "move-ports",
                "target chassis has no logical switches",
            )
            .into());
        }
        let transport = self.transport;

        for entry in self.identity_entries() {
            let label = self.entry_label(&entry);
            let Some(reference_switch) = self.reference.switch(entry.reference_fid) else {
                continue;
            };
            let Some(target_switch) = self.target.switch(entry.target_fid) else {
                self.switch_diagnostic(
                    entry.target_fid,
                    &label,
                    format!("Cannot move ports: FID {} does not exist", entry.target_fid),
                );
                continue;
            };

            // Group the missing ports by their current owner.
            let mut by_owner: std::collections::BTreeMap<u8, Vec<String>> =
                std::collections::BTreeMap::new();
            for port in reference_switch.ports.keys() {
                if target_switch.ports.contains_key(port) {
                    continue;
                }
                if let Some(owner) = self.target.port_owner(port) {
                    by_owner.entry(owner).or_default().push(port.clone());
                }
            }

            for (owner, ports) in by_owner {
                let count = ports.len();
                let owner_label = self
                    .target
                    .switch(owner)
                    .map_or_else(|| format!("FID {owner}"), |s| s.label());
                let body = json!({"fabric-id": entry.target_fid, "ports": ports});
                match transport
                    .request(Method::Post, resources::LOGICAL_SWITCH_PORT_MEMBERS, Some(body))
                    .await
                {
                    Ok(_) => {
                        self.records.switch(entry.target_fid, &label).ports_added += count;
                        self.records.switch(owner, &owner_label).ports_removed += count;
                    }
                    Err(e) => {
                        self.records.switch(entry.target_fid, &label).ports_failed += count;
                        self.switch_diagnostic(
                            entry.target_fid,
                            &label,
                            format!("Failed to move {count} port(s) from FID {owner}: {e}"),
                        );
                    }
                }
            }
        }

        Ok(())
    }

    /// Patches one chassis-level resource under its whitelist.
    pub(super) async fn patch_chassis(
        &mut self,
        resource: &'static str,
        whitelist: &'static [&'static str],
    ) -> Result<(), RestoreError> {
        if self.target.is_partial(resource) {
            debug!("Skipping {resource}: target data is partial");
            return Ok(());
        }
        let transport = self.transport;
        let empty = Attributes::new();
        let reference = self.reference.attributes.get(resource).unwrap_or(&empty);
        let target = self
            .target
            .chassis
            .attributes
            .get(resource)
            .unwrap_or(&empty);

        let changes = diff_attributes(reference, target, whitelist);
        if changes.is_empty() {
            return Ok(());
        }

        debug!("{resource}: {} attribute(s) differ", changes.len());
        if let Err(e) = transport
            .request(Method::Patch, resource, Some(changes.to_payload()))
            .await
        {
            self.chassis_diagnostic(format!("Failed to update {resource}: {e}"));
        }

        Ok(())
    }

    /// Creates reference user accounts missing on the target.
    ///
    /// Existing accounts are never modified or deleted; new accounts get
    /// the default temporary password with a forced change.
    pub(super) async fn create_users(
        &mut self,
        whitelist: &'static [&'static str],
    ) -> Result<(), RestoreError> {
        if self.target.is_partial(resources::USER_CONFIG) {
            debug!("Skipping user accounts: target data is partial");
            return Ok(());
        }
        let transport = self.transport;

        let existing: std::collections::BTreeSet<&str> = self
            .target
            .chassis
            .users
            .iter()
            .filter_map(|u| u.get("name").and_then(Value::as_str))
            .chain(RESERVED_USERS.iter().copied())
            .collect();

        let mut content = Vec::new();
        let mut names = Vec::new();
        for user in &self.reference.users {
            let Some(name) = user.get("name").and_then(Value::as_str) else {
                continue;
            };
            if existing.contains(name) {
                continue;
            }
            let mut bag = serde_json::Map::new();
            for &attr in whitelist {
                if let Some(value) = user.get(attr) {
                    if !value.is_null() {
                        bag.insert(attr.to_string(), value.clone());
                    }
                }
            }
            bag.insert(String::from("password"), json!(DEFAULT_USER_PASSWORD));
            bag.insert(String::from("password-change-enforced"), json!(true));
            content.push(Value::Object(bag));
            names.push(name.to_string());
        }

        if content.is_empty() {
            return Ok(());
        }

        match transport
            .request(Method::Post, resources::USER_CONFIG, Some(Value::Array(content)))
            .await
        {
            Ok(_) => {
                let label = self.reference.label().to_string();
                for name in names {
                    self.records
                        .chassis(&label)
                        .users_added
                        .push(format!("{name} (temporary password, change enforced)"));
                }
            }
            Err(e) => {
                self.chassis_diagnostic(format!("Failed to create user accounts: {e}"));
            }
        }

        Ok(())
    }

    /// Patches one per-switch resource under its whitelist for every
    /// mapped switch.
    pub(super) async fn patch_switch(
        &mut self,
        resource: &'static str,
        whitelist: &'static [&'static str],
    ) -> Result<(), RestoreError> {
        let transport = self.transport;

        for entry in self.identity_entries() {
            let label = self.entry_label(&entry);
            let path = fid_path(resource, entry.target_fid);
            let Some(target_switch) = self.target.switch(entry.target_fid) else {
                self.switch_diagnostic(
                    entry.target_fid,
                    &label,
                    format!("Cannot update {resource}: FID {} does not exist", entry.target_fid),
                );
                continue;
            };
            if self.target.is_partial(&path) {
                debug!("Skipping {path}: target data is partial");
                continue;
            }
            let Some(reference_switch) = self.reference.switch(entry.reference_fid) else {
                continue;
            };

            let empty = Attributes::new();
            let reference = reference_switch.attributes.get(resource).unwrap_or(&empty);
            let target = target_switch.attributes.get(resource).unwrap_or(&empty);

            let mut changes = diff_attributes(reference, target, whitelist);
            if target_switch.ficon_switch {
                for &attr in super::action::FICON_SENSITIVE_SETTINGS {
                    if changes.remove(attr).is_some() {
                        debug!("{label}: not setting {attr} on a FICON switch");
                    }
                }
            }
            if changes.is_empty() {
                continue;
            }

            debug!("{label}: {resource}: {} attribute(s) differ", changes.len());
            if let Err(e) = transport
                .request(Method::Patch, &path, Some(changes.to_payload()))
                .await
            {
                self.switch_diagnostic(
                    entry.target_fid,
                    &label,
                    format!("Failed to update {resource}: {e}"),
                );
            }
        }

        Ok(())
    }

    /// Patches port attributes under the whitelist for every mapped
    /// switch, batching per switch.
    pub(super) async fn patch_ports(
        &mut self,
        whitelist: &'static [&'static str],
    ) -> Result<(), RestoreError> {
        let transport = self.transport;

        for entry in self.identity_entries() {
            let label = self.entry_label(&entry);
            let path = fid_path(resources::FC_PORTS, entry.target_fid);
            let Some(target_switch) = self.target.switch(entry.target_fid) else {
                self.switch_diagnostic(
                    entry.target_fid,
                    &label,
                    format!("Cannot update ports: FID {} does not exist", entry.target_fid),
                );
                continue;
            };
            if self.target.is_partial(&path) {
                debug!("Skipping {path}: target data is partial");
                continue;
            }
            let Some(reference_switch) = self.reference.switch(entry.reference_fid) else {
                continue;
            };

            let mut content = Vec::new();
            for (port, reference_attrs) in &reference_switch.ports {
                // Ports the target chassis does not have are ignored.
                let Some(target_attrs) = target_switch.ports.get(port) else {
                    continue;
                };
                let changes = diff_attributes(reference_attrs, target_attrs, whitelist);
                if changes.is_empty() {
                    continue;
                }
                let Value::Object(mut bag) = changes.to_payload() else {
                    continue;
                };
                bag.insert(String::from("name"), json!(port));
                content.push(Value::Object(bag));
            }

            if content.is_empty() {
                continue;
            }

            debug!("{label}: {} port(s) differ", content.len());
            if let Err(e) = transport
                .request(Method::Patch, &path, Some(Value::Array(content)))
                .await
            {
                self.switch_diagnostic(
                    entry.target_fid,
                    &label,
                    format!("Failed to update ports: {e}"),
                );
            }
        }

        Ok(())
    }

    /// Queues CLI commands for port settings the API cannot express.
    ///
    /// Nothing is sent here; the queue is flushed as one batch by the
    /// flush action so the settle delay is paid once.
    pub(super) fn queue_cli_port_settings(&mut self) {
        for entry in self.identity_entries() {
            let Some(target_switch) = self.target.switch(entry.target_fid) else {
                continue;
            };
            let Some(reference_switch) = self.reference.switch(entry.reference_fid) else {
                continue;
            };

            for (port, reference_attrs) in &reference_switch.ports {
                let Some(target_attrs) = target_switch.ports.get(port) else {
                    continue;
                };
                let changes = diff_attributes(reference_attrs, target_attrs, CLI_PORT_SETTINGS);
                for (name, value) in changes.iter() {
                    if let Some(command) = cli_command_for(port, name, value) {
                        self.cli_queue.push((entry.target_fid, command));
                    }
                }
            }
        }

        if !self.cli_queue.is_empty() {
            debug!("{} CLI command(s) queued", self.cli_queue.len());
        }
    }

    /// Flushes the queued CLI commands, then waits for the device's API
    /// and CLI control paths to converge.
    pub(super) async fn flush_cli_queue(&mut self) -> Result<(), RestoreError> {
        if self.cli_queue.is_empty() {
            return Ok(());
        }
        let transport = self.transport;
        let queue = std::mem::take(&mut self.cli_queue);

        for (fid, command) in queue {
            let body = json!({"fid": fid, "command": command});
            if let Err(e) = transport
                .request(Method::Post, resources::CLI_COMMAND, Some(body))
                .await
            {
                let label = self
                    .target
                    .switch(fid)
                    .map_or_else(|| format!("FID {fid}"), |s| s.label());
                self.switch_diagnostic(fid, &label, format!("CLI command failed: {e}"));
            }
        }

        tokio::time::sleep(self.config.cli_settle).await;
        Ok(())
    }

    /// Replicates missing MAPS rules and the active policy for every
    /// mapped switch.
    pub(super) async fn sync_maps(&mut self) -> Result<(), RestoreError> {
        let transport = self.transport;

        for entry in self.identity_entries() {
            let label = self.entry_label(&entry);
            let rules_path = fid_path(resources::MAPS_RULE, entry.target_fid);
            let Some(target_switch) = self.target.switch(entry.target_fid) else {
                self.switch_diagnostic(
                    entry.target_fid,
                    &label,
                    format!("Cannot update MAPS: FID {} does not exist", entry.target_fid),
                );
                continue;
            };
            if self.target.is_partial(&rules_path) {
                debug!("Skipping {rules_path}: target data is partial");
                continue;
            }
            let Some(reference_switch) = self.reference.switch(entry.reference_fid) else {
                continue;
            };

            let reference_rules: Vec<String> = reference_switch
                .maps_rules
                .iter()
                .filter_map(rule_name)
                .collect();
            let target_rules: Vec<String> = target_switch
                .maps_rules
                .iter()
                .filter_map(rule_name)
                .collect();

            let delta = diff_membership(&reference_rules, &target_rules);
            let mut changed = false;
            if !delta.added.is_empty() {
                let missing: Vec<Value> = reference_switch
                    .maps_rules
                    .iter()
                    .filter(|bag| {
                        rule_name(bag).is_some_and(|name| delta.added.contains(&name))
                    })
                    .map(|bag| Value::Object(bag.clone().into_iter().collect()))
                    .collect();
                match transport
                    .request(Method::Post, &rules_path, Some(Value::Array(missing)))
                    .await
                {
                    Ok(_) => changed = true,
                    Err(e) => {
                        self.switch_diagnostic(
                            entry.target_fid,
                            &label,
                            format!("Failed to create MAPS rules: {e}"),
                        );
                    }
                }
            }

            let reference_policy = reference_switch.maps_active_policy.clone();
            let target_policy = self
                .target
                .switch(entry.target_fid)
                .and_then(|s| s.maps_active_policy.clone());
            if let Some(policy) = reference_policy {
                if target_policy.as_deref() != Some(policy.as_str()) {
                    match transport
                        .request(
                            Method::Patch,
                            &fid_path(resources::MAPS_POLICY, entry.target_fid),
                            Some(json!({"name": policy})),
                        )
                        .await
                    {
                        Ok(_) => changed = true,
                        Err(e) => {
                            self.switch_diagnostic(
                                entry.target_fid,
                                &label,
                                format!("Failed to activate MAPS policy: {e}"),
                            );
                        }
                    }
                }
            }

            if changed {
                self.records.switch(entry.target_fid, &label).policy_changed = true;
            }
        }

        Ok(())
    }

    /// Replaces the zone database wholesale when any membership differs,
    /// optionally activating the reference's effective configuration.
    pub(super) async fn restore_zoning(&mut self) -> Result<(), RestoreError> {
        let transport = self.transport;

        for entry in self.identity_entries() {
            let Some(reference_switch) = self.reference.switch(entry.reference_fid) else {
                continue;
            };
            let Some(reference_zoning) = reference_switch.zoning.clone() else {
                continue;
            };
            let label = self.entry_label(&entry);
            let defined_path = fid_path(resources::ZONING_DEFINED, entry.target_fid);
            let Some(target_switch) = self.target.switch(entry.target_fid) else {
                self.switch_diagnostic(
                    entry.target_fid,
                    &label,
                    format!("Cannot restore zoning: FID {} does not exist", entry.target_fid),
                );
                continue;
            };
            if self.target.is_partial(&defined_path) {
                self.switch_diagnostic(
                    entry.target_fid,
                    &label,
                    String::from("Zoning not restored: target zone data was not readable"),
                );
                continue;
            }

            let target_zoning = target_switch.zoning.clone().unwrap_or_default();

            if zone_db_differs(&reference_zoning, &target_zoning) {
                match transport
                    .request(
                        Method::Post,
                        &defined_path,
                        Some(reference_zoning.to_defined_payload()),
                    )
                    .await
                {
                    Ok(_) => {
                        self.records.switch(entry.target_fid, &label).zoning_changed = true;
                    }
                    Err(e) => {
                        self.switch_diagnostic(
                            entry.target_fid,
                            &label,
                            format!("Failed to replace zone database: {e}"),
                        );
                        continue;
                    }
                }
            }

            if self.activate_zones {
                if let Some(cfg) = reference_zoning.effective.clone() {
                    if target_zoning.effective.as_deref() != Some(cfg.as_str()) {
                        match transport
                            .request(
                                Method::Patch,
                                &fid_path(resources::ZONING_EFFECTIVE, entry.target_fid),
                                Some(json!({"cfg-name": cfg})),
                            )
                            .await
                        {
                            Ok(_) => {
                                self.records
                                    .switch(entry.target_fid, &label)
                                    .enabled_zone_config = Some(cfg);
                            }
                            Err(e) => {
                                self.switch_diagnostic(
                                    entry.target_fid,
                                    &label,
                                    format!("Failed to enable zone configuration {cfg}: {e}"),
                                );
                            }
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Enables every mapped switch and port whose reference counterpart
    /// was enabled.
    pub(super) async fn enable_all(&mut self) -> Result<(), RestoreError> {
        let transport = self.transport;

        for entry in self.identity_entries() {
            let label = self.entry_label(&entry);
            let Some(target_switch) = self.target.switch(entry.target_fid) else {
                continue;
            };
            let Some(reference_switch) = self.reference.switch(entry.reference_fid) else {
                continue;
            };
            if !reference_switch.is_enabled() {
                continue;
            }

            let switch_disabled = !target_switch.is_enabled();
            let content: Vec<Value> = reference_switch
                .ports
                .keys()
                .filter(|port| {
                    reference_switch.is_port_enabled(port)
                        && target_switch.ports.contains_key(*port)
                        && !target_switch.is_port_enabled(port)
                })
                .map(|port| json!({"name": port, "enabled-state": true}))
                .collect();

            if switch_disabled {
                if let Err(e) = transport
                    .request(
                        Method::Patch,
                        &fid_path(resources::FC_SWITCH, entry.target_fid),
                        Some(json!({"enabled-state": true})),
                    )
                    .await
                {
                    self.switch_diagnostic(
                        entry.target_fid,
                        &label,
                        format!("Failed to enable switch: {e}"),
                    );
                    // A disabled switch is not in a fabric; nothing else
                    // in it can be enabled.
                    continue;
                }
            }

            if content.is_empty() {
                continue;
            }

            if let Err(e) = transport
                .request(
                    Method::Patch,
                    &fid_path(resources::FC_PORTS, entry.target_fid),
                    Some(Value::Array(content)),
                )
                .await
            {
                self.switch_diagnostic(
                    entry.target_fid,
                    &label,
                    format!("Failed to enable ports: {e}"),
                );
            }
        }

        Ok(())
    }
}

/// True when any alias, zone, or zone-config membership differs between
/// the two databases.
///
/// Comparison is order-insensitive and ignores the effective
/// configuration: replacing the defined database never hinges on what is
/// currently active.
#[must_use]
pub fn zone_db_differs(reference: &ZoneDb, target: &ZoneDb) -> bool {
    let reference_aliases: Vec<&String> = reference.aliases.keys().collect();
    let target_aliases: Vec<&String> = target.aliases.keys().collect();
    if !diff_membership(&reference_aliases, &target_aliases).is_unchanged() {
        return true;
    }
    for (name, members) in &reference.aliases {
        let target_members = &target.aliases[name];
        if !diff_membership(members, target_members).is_unchanged() {
            return true;
        }
    }

    let reference_zones: Vec<&String> = reference.zones.keys().collect();
    let target_zones: Vec<&String> = target.zones.keys().collect();
    if !diff_membership(&reference_zones, &target_zones).is_unchanged() {
        return true;
    }
    for (name, zone) in &reference.zones {
        let target_zone = &target.zones[name];
        if zone.kind != target_zone.kind
            || !diff_membership(&zone.members, &target_zone.members).is_unchanged()
            || !diff_membership(&zone.principal_members, &target_zone.principal_members)
                .is_unchanged()
        {
            return true;
        }
    }

    let reference_configs: Vec<&String> = reference.configs.keys().collect();
    let target_configs: Vec<&String> = target.configs.keys().collect();
    if !diff_membership(&reference_configs, &target_configs).is_unchanged() {
        return true;
    }
    for (name, zones) in &reference.configs {
        if !diff_membership(zones, &target.configs[name]).is_unchanged() {
            return true;
        }
    }

    false
}

/// Name of a MAPS rule attribute bag.
fn rule_name(bag: &Attributes) -> Option<String> {
    bag.get("name").and_then(Value::as_str).map(String::from)
}

/// Maps one differing CLI-only setting to its device command.
fn cli_command_for(port: &str, name: &str, value: &Value) -> Option<String> {
    match name {
        "locked-e-port" => {
            let locked = value.as_bool()?;
            Some(format!(
                "portcfgeport {port} -p {}",
                if locked { 2 } else { 1 }
            ))
        }
        "long-distance" => {
            let mode = value.as_str()?;
            Some(format!("portcfglongdistance {port} {mode}"))
        }
        "isl-ready-mode" => {
            let enabled = value.as_bool()?;
            Some(format!("portcfgislmode {port} {}", u8::from(enabled)))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_db() -> ZoneDb {
        let mut db = ZoneDb::default();
        db.aliases
            .insert(String::from("h1"), vec![String::from("10:00:01")]);
        db.zones.insert(
            String::from("z1"),
            crate::model::Zone {
                members: vec![String::from("h1"), String::from("t1")],
                ..crate::model::Zone::default()
            },
        );
        db.configs
            .insert(String::from("c1"), vec![String::from("z1")]);
        db
    }

    #[test]
    fn test_zone_db_reordered_members_do_not_differ() {
        let reference = sample_db();
        let mut target = sample_db();
        let zone = target.zones.get_mut("z1").expect("zone exists");
        zone.members.reverse();

        assert!(!zone_db_differs(&reference, &target));
    }

    #[test]
    fn test_zone_db_missing_member_differs() {
        let reference = sample_db();
        let mut target = sample_db();
        target
            .zones
            .get_mut("z1")
            .expect("zone exists")
            .members
            .pop();

        assert!(zone_db_differs(&reference, &target));
    }

    #[test]
    fn test_zone_db_effective_ignored() {
        let reference = sample_db();
        let mut target = sample_db();
        target.effective = Some(String::from("c_other"));

        assert!(!zone_db_differs(&reference, &target));
    }

    #[test]
    fn test_zone_db_extra_target_alias_differs() {
        let reference = sample_db();
        let mut target = sample_db();
        target
            .aliases
            .insert(String::from("stray"), vec![String::from("10:00:99")]);

        assert!(zone_db_differs(&reference, &target));
    }

    #[test]
    fn test_cli_command_mapping() {
        assert_eq!(
            cli_command_for("0/4", "locked-e-port", &serde_json::json!(true)),
            Some(String::from("portcfgeport 0/4 -p 2"))
        );
        assert_eq!(
            cli_command_for("0/4", "long-distance", &serde_json::json!("LD")),
            Some(String::from("portcfglongdistance 0/4 LD"))
        );
        assert_eq!(
            cli_command_for("0/4", "isl-ready-mode", &serde_json::json!(false)),
            Some(String::from("portcfgislmode 0/4 0"))
        );
        assert_eq!(cli_command_for("0/4", "unknown", &serde_json::json!(1)), None);
    }
}
