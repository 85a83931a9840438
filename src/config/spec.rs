//! Plan-file specification types.
//!
//! A plan file describes one restore run: the target device, the
//! snapshot to replay, the restore categories, and the FID mappings.
//! Everything can also be supplied as CLI flags; the plan file is the
//! reproducible form.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::engine::{Category, MappingRule};
use crate::error::ConfigError;

/// Environment variable read for the device password by default.
const DEFAULT_PASSWORD_ENV: &str = "FOS_PASSWORD";

/// The root plan-file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestorePlan {
    /// The device to restore to.
    pub target: TargetConfig,
    /// Path of the snapshot file to restore from.
    pub snapshot: PathBuf,
    /// WWN of the chassis within the snapshot, when it holds several.
    #[serde(default)]
    pub wwn: Option<String>,
    /// Restore category tokens (`vfs`, `s`, `z`, ... or `*`).
    #[serde(default)]
    pub restore: Vec<String>,
    /// Compact FID-map string, e.g. `1;20,3,,23,switch_23`.
    #[serde(default)]
    pub fid_map: Option<String>,
    /// Structured FID mappings; mutually exclusive with `fid_map`.
    #[serde(default)]
    pub mappings: Vec<MappingRule>,
    /// Override for the CLI settle delay, in seconds.
    #[serde(default)]
    pub cli_settle_secs: Option<u64>,
}

/// Connection settings for the target device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Base URL of the device, e.g. `https://10.1.1.1`.
    pub host: String,
    /// Login user ID.
    pub username: String,
    /// Environment variable holding the password.
    #[serde(default = "default_password_env")]
    pub password_env: String,
}

fn default_password_env() -> String {
    String::from(DEFAULT_PASSWORD_ENV)
}

impl RestorePlan {
    /// Resolves the category selection from the `restore` tokens.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown category token.
    pub fn categories(&self) -> Result<BTreeSet<Category>, ConfigError> {
        Category::parse_selection(&self.restore.join(","))
    }

    /// Resolves the mapping rules from either the compact string or the
    /// structured list.
    ///
    /// # Errors
    ///
    /// Returns an error when both forms are given, or the compact string
    /// is malformed.
    pub fn mapping_rules(&self) -> Result<Vec<MappingRule>, ConfigError> {
        match (&self.fid_map, self.mappings.is_empty()) {
            (Some(_), false) => Err(ConfigError::validation_general(
                "Use either fid_map or mappings, not both",
            )),
            (Some(compact), true) => super::parser::parse_fid_map(compact),
            (None, _) => Ok(self.mappings.clone()),
        }
    }
}

impl TargetConfig {
    /// Reads the device password from the configured environment
    /// variable.
    ///
    /// # Errors
    ///
    /// Returns an error when the variable is unset.
    pub fn password(&self) -> Result<String, ConfigError> {
        std::env::var(&self.password_env).map_err(|_| ConfigError::MissingEnvVar {
            name: self.password_env.clone(),
        })
    }
}
