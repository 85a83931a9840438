//! Output formatting for CLI commands.
//!
//! This module renders the outcome report and scan listings either as
//! text with tables or as JSON.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::engine::{Report, RunStatus};
use crate::model::ChassisRecord;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Per-scope row for the report table.
#[derive(Tabled)]
struct ScopeRow {
    #[tabled(rename = "Scope")]
    scope: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Removed")]
    removed: String,
    #[tabled(rename = "Ports +/-/x")]
    ports: String,
    #[tabled(rename = "Zoning")]
    zoning: String,
    #[tabled(rename = "MAPS")]
    maps: String,
    #[tabled(rename = "Issues")]
    issues: usize,
}

/// Per-switch row for the scan listing.
#[derive(Tabled)]
struct ScanRow {
    #[tabled(rename = "FID")]
    fid: u8,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Domain")]
    domain: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
    #[tabled(rename = "Ports")]
    ports: usize,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the final report.
    #[must_use]
    pub fn format_report(&self, report: &Report) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Text => Self::format_report_text(report),
        }
    }

    /// Formats a report as text.
    fn format_report_text(report: &Report) -> String {
        let mut output = String::new();

        let status = match &report.status {
            RunStatus::Completed if report.has_issues() => {
                format!(
                    "{} completed with {} issue(s)",
                    "!".yellow(),
                    report.issues
                )
            }
            RunStatus::Completed => format!("{} completed", "ok".green()),
            RunStatus::Aborted { reason } => format!("{} {reason}", "aborted:".red()),
            RunStatus::Cancelled => format!("{}", "cancelled by user".yellow()),
        };
        let _ = writeln!(output, "Restore run {}: {status}\n", report.run_id);

        if report.scopes.is_empty() {
            let _ = writeln!(output, "No changes were attempted.");
            return output;
        }

        let flag = |b: bool| if b { String::from("yes") } else { String::new() };
        let rows: Vec<ScopeRow> = report
            .scopes
            .iter()
            .map(|scope| {
                let o = &scope.outcome;
                ScopeRow {
                    scope: scope.label.clone(),
                    created: flag(o.created),
                    removed: flag(o.removed),
                    ports: if o.ports_added + o.ports_removed + o.ports_failed > 0 {
                        format!("{}/{}/{}", o.ports_added, o.ports_removed, o.ports_failed)
                    } else {
                        String::new()
                    },
                    zoning: match &o.enabled_zone_config {
                        Some(cfg) => format!("enabled {cfg}"),
                        None => flag(o.zoning_changed),
                    },
                    maps: flag(o.policy_changed),
                    issues: o.diagnostics.len(),
                }
            })
            .collect();
        let _ = writeln!(output, "{}", Table::new(rows));

        for scope in &report.scopes {
            for user in &scope.outcome.users_added {
                let _ = writeln!(output, "User added: {user}");
            }
        }
        for scope in &report.scopes {
            for diagnostic in &scope.outcome.diagnostics {
                let _ = writeln!(output, "{} {}: {diagnostic}", "!".yellow(), scope.label);
            }
        }

        output
    }

    /// Formats a chassis listing for the scan command.
    #[must_use]
    pub fn format_scan(&self, heading: &str, chassis: &ChassisRecord) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(chassis).unwrap_or_default(),
            OutputFormat::Text => {
                let mut output = String::new();
                let _ = writeln!(output, "{}: {}", heading.bold(), chassis.label());

                let rows: Vec<ScanRow> = chassis
                    .switches
                    .values()
                    .map(|switch| ScanRow {
                        fid: switch.fid,
                        name: switch.switch_name().unwrap_or_default().to_string(),
                        domain: switch
                            .domain_id()
                            .map(|d| d.to_string())
                            .unwrap_or_default(),
                        enabled: if switch.is_enabled() {
                            String::from("yes")
                        } else {
                            String::from("no")
                        },
                        ports: switch.ports.len(),
                    })
                    .collect();
                if rows.is_empty() {
                    let _ = writeln!(output, "  (no logical switches)");
                } else {
                    let _ = writeln!(output, "{}", Table::new(rows));
                }
                output
            }
        }
    }

    /// Prints a success line.
    pub fn success(&self, message: &str) {
        if self.format == OutputFormat::Text {
            eprintln!("{} {message}", "ok".green());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{RecordSet, Report};
    use uuid::Uuid;

    #[test]
    fn test_text_report_mentions_issues() {
        let mut records = RecordSet::default();
        records
            .switch(2, "FID 2")
            .diagnostics
            .push(String::from("boom"));

        let report = Report::summarize(Uuid::new_v4(), &records, RunStatus::Completed);
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let text = formatter.format_report(&report);

        assert!(text.contains("1 issue(s)"));
        assert!(text.contains("boom"));
    }

    #[test]
    fn test_json_report_is_parseable() {
        let records = RecordSet::default();
        let report = Report::summarize(Uuid::new_v4(), &records, RunStatus::Completed);
        let formatter = OutputFormatter::new(OutputFormat::Json);

        let value: serde_json::Value =
            serde_json::from_str(&formatter.format_report(&report)).expect("valid JSON");
        assert_eq!(value["status"]["kind"], "completed");
    }
}
