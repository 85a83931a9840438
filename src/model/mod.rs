//! Domain model for the restore engine.
//!
//! Chassis, logical switches, and ports are treated as opaque attribute
//! bags with stable keys; the engine never interprets attribute values
//! beyond equality and type comparison. The same shapes serve both the
//! immutable reference inventory (loaded from a snapshot file) and the
//! mutable target state tree (rebuilt from live captures).

mod inventory;
mod zone;

pub use inventory::{
    Attributes, ChassisRecord, ReferenceInventory, SwitchRecord, TargetState, fid_path,
    resources,
};
pub use zone::{Zone, ZoneDb, ZoneKind};
