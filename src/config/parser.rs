//! Plan-file loading and the compact FID-map format.
//!
//! The compact format packs mapping rules into one string: rules are
//! separated by `;`, fields within a rule by `,`, in the order
//! `reference,target,fabric_name,domain_id,switch_name`. An empty field
//! inherits from the reference switch; the literal `none` suppresses the
//! field. `1;20,3,,23,switch_23` maps FID 1 onto itself and FID 20 onto
//! FID 3 with domain ID 23 and a new switch name.

use std::path::Path;
use tracing::debug;

use crate::engine::MappingRule;
use crate::error::{ConfigError, Result, RestoreError};

use super::spec::RestorePlan;

/// Parser for plan files.
#[derive(Debug, Default)]
pub struct ConfigParser;

impl ConfigParser {
    /// Creates a new parser.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Loads and validates a plan file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, not valid YAML, or fails
    /// validation.
    pub fn load(&self, path: &Path) -> Result<RestorePlan> {
        debug!("Loading plan file: {}", path.display());

        let text = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RestoreError::Config(ConfigError::FileNotFound {
                    path: path.to_path_buf(),
                })
            } else {
                RestoreError::Io(e)
            }
        })?;

        let plan: RestorePlan = serde_yaml::from_str(&text)
            .map_err(|e| ConfigError::parse("plan file", e.to_string()))?;

        Self::validate(&plan)?;
        Ok(plan)
    }

    /// Validates a plan, whether loaded from a file or assembled from
    /// CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first failing field.
    pub fn validate(plan: &RestorePlan) -> Result<()> {
        if plan.target.host.is_empty() {
            return Err(ConfigError::validation("host must not be empty", "target.host").into());
        }
        if plan.target.username.is_empty() {
            return Err(
                ConfigError::validation("username must not be empty", "target.username").into(),
            );
        }
        if plan.snapshot.as_os_str().is_empty() {
            return Err(ConfigError::validation("snapshot must be set", "snapshot").into());
        }
        // Surface bad tokens and conflicting mapping forms at load time,
        // not at pipeline time.
        plan.categories()?;
        plan.mapping_rules()?;
        Ok(())
    }
}

/// Parses the compact FID-map string into mapping rules.
///
/// # Errors
///
/// Returns an error for an empty rule; field values are validated later,
/// when the identity map is built, so one bad rule does not reject the
/// whole run.
pub fn parse_fid_map(raw: &str) -> std::result::Result<Vec<MappingRule>, ConfigError> {
    let mut rules = Vec::new();

    for (index, entry) in raw.split(';').enumerate() {
        let fields: Vec<&str> = entry.split(',').map(str::trim).collect();
        let reference = fields.first().copied().unwrap_or_default();
        if reference.is_empty() {
            return Err(ConfigError::parse(
                "FID map",
                format!("rule {index} has no reference FID"),
            ));
        }
        let field = |i: usize| {
            fields
                .get(i)
                .copied()
                .filter(|s| !s.is_empty())
                .map(String::from)
        };
        rules.push(MappingRule {
            reference: String::from(reference),
            target: field(1),
            fabric_name: field(2),
            domain_id: field(3),
            switch_name: field(4),
        });
    }

    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetConfig;
    use std::io::Write;

    fn sample_plan() -> RestorePlan {
        RestorePlan {
            target: TargetConfig {
                host: String::from("https://10.1.1.1"),
                username: String::from("admin"),
                password_env: String::from("FOS_PASSWORD"),
            },
            snapshot: std::path::PathBuf::from("capture.json"),
            wwn: None,
            restore: vec![String::from("vfs"), String::from("s")],
            fid_map: None,
            mappings: vec![],
            cli_settle_secs: None,
        }
    }

    #[test]
    fn test_parse_compact_fid_map() {
        let rules = parse_fid_map("1;20,3,,23,switch_23;20,4,None,24,switch_24")
            .expect("map should parse");

        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].reference, "1");
        assert_eq!(rules[0].target, None);

        assert_eq!(rules[1].reference, "20");
        assert_eq!(rules[1].target.as_deref(), Some("3"));
        assert_eq!(rules[1].fabric_name, None);
        assert_eq!(rules[1].domain_id.as_deref(), Some("23"));
        assert_eq!(rules[1].switch_name.as_deref(), Some("switch_23"));

        assert_eq!(rules[2].fabric_name.as_deref(), Some("None"));
    }

    #[test]
    fn test_parse_rejects_empty_rule() {
        let err = parse_fid_map("1;;2").expect_err("empty rule should fail");
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_load_plan_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            concat!(
                "target:\n",
                "  host: https://10.1.1.1\n",
                "  username: admin\n",
                "snapshot: capture.json\n",
                "restore: [vfs, s, z]\n",
                "fid_map: \"1;20,3\"\n",
            )
        )
        .expect("write plan");

        let plan = ConfigParser::new()
            .load(file.path())
            .expect("plan should load");
        assert_eq!(plan.target.username, "admin");
        assert_eq!(plan.target.password_env, "FOS_PASSWORD");
        assert_eq!(plan.mapping_rules().expect("rules").len(), 2);
        assert_eq!(plan.categories().expect("categories").len(), 3);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ConfigParser::new()
            .load(Path::new("/nonexistent/plan.yaml"))
            .expect_err("missing file should fail");
        assert!(matches!(
            err,
            RestoreError::Config(ConfigError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_conflicting_mapping_forms() {
        let mut plan = sample_plan();
        plan.fid_map = Some(String::from("1"));
        plan.mappings = vec![MappingRule {
            reference: String::from("1"),
            ..MappingRule::default()
        }];

        assert!(ConfigParser::validate(&plan).is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_category() {
        let mut plan = sample_plan();
        plan.restore = vec![String::from("bogus")];

        assert!(ConfigParser::validate(&plan).is_err());
    }
}
