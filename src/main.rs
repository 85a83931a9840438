//! Fabric Restore CLI entrypoint.
//!
//! This is the main entrypoint for the fabric-restore command-line tool.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use fabric_restore::cli::{Cli, Commands, OutputFormatter};
use fabric_restore::config::{ConfigParser, RestorePlan, TargetConfig};
use fabric_restore::engine::{CancelFlag, CapturePlan, Pipeline, PipelineConfig, RunStatus, capture};
use fabric_restore::error::{ConfigError, Result, RestoreError};
use fabric_restore::fos::FosClient;
use fabric_restore::model::ReferenceInventory;

use clap::Parser;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Pick up FOS_PASSWORD and friends from a local .env, if present.
    let _ = dotenvy::dotenv();

    init_logging(cli.verbose);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<ExitCode> {
    let formatter = OutputFormatter::new(cli.output);

    match cli.command {
        Commands::Restore {
            host,
            username,
            snapshot,
            wwn,
            restore,
            fid_map,
            yes,
        } => {
            let plan = resolve_plan(
                cli.plan.as_deref(),
                host,
                username,
                snapshot,
                wwn,
                restore,
                fid_map,
            )?;
            cmd_restore(&plan, yes, &formatter).await
        }
        Commands::Scan {
            host,
            username,
            snapshot,
        } => cmd_scan(cli.plan.as_deref(), host, username, snapshot, &formatter).await,
        Commands::Validate => cmd_validate(cli.plan.as_deref(), &formatter),
    }
}

/// Builds the effective plan from the plan file and flag overrides.
#[allow(clippy::too_many_arguments)]
fn resolve_plan(
    plan_path: Option<&std::path::Path>,
    host: Option<String>,
    username: Option<String>,
    snapshot: Option<PathBuf>,
    wwn: Option<String>,
    restore: Option<String>,
    fid_map: Option<String>,
) -> Result<RestorePlan> {
    let mut plan = match plan_path {
        Some(path) => ConfigParser::new().load(path)?,
        None => RestorePlan {
            target: TargetConfig {
                host: String::new(),
                username: String::new(),
                password_env: String::from("FOS_PASSWORD"),
            },
            snapshot: PathBuf::new(),
            wwn: None,
            restore: vec![],
            fid_map: None,
            mappings: vec![],
            cli_settle_secs: None,
        },
    };

    if let Some(host) = host {
        plan.target.host = host;
    }
    if let Some(username) = username {
        plan.target.username = username;
    }
    if let Some(snapshot) = snapshot {
        plan.snapshot = snapshot;
    }
    if let Some(wwn) = wwn {
        plan.wwn = Some(wwn);
    }
    if let Some(restore) = restore {
        plan.restore = restore.split(',').map(str::to_string).collect();
    }
    if let Some(fid_map) = fid_map {
        plan.fid_map = Some(fid_map);
        plan.mappings.clear();
    }

    ConfigParser::validate(&plan)?;
    Ok(plan)
}

/// Runs a restore.
async fn cmd_restore(
    plan: &RestorePlan,
    yes: bool,
    formatter: &OutputFormatter,
) -> Result<ExitCode> {
    let categories = plan.categories()?;
    if categories.is_empty() {
        return Err(ConfigError::validation_general(
            "No restore categories selected; pass --restore or set restore in the plan",
        )
        .into());
    }
    let rules = plan.mapping_rules()?;
    let password = plan.target.password()?;

    let inventory = ReferenceInventory::load(&plan.snapshot)?;
    let reference = inventory.select_chassis(plan.wwn.as_deref())?;

    info!(
        "Restoring {} onto {} (categories: {})",
        reference.label(),
        plan.target.host,
        categories
            .iter()
            .map(|c| c.token())
            .collect::<Vec<_>>()
            .join(",")
    );

    if !yes && !confirm(&format!(
        "Apply {} categories to {}? [y/N] ",
        categories.len(),
        plan.target.host
    )) {
        warn!("Restore not confirmed; nothing was changed");
        return Ok(ExitCode::FAILURE);
    }

    let client = FosClient::login(&plan.target.host, &plan.target.username, &password).await?;

    let cancel = CancelFlag::new();
    let signal_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; stopping at the next action boundary");
            signal_flag.set();
        }
    });

    let mut config = PipelineConfig::for_categories(categories);
    if let Some(secs) = plan.cli_settle_secs {
        config.cli_settle = std::time::Duration::from_secs(secs);
    }

    let report = Pipeline::new(&client, reference, rules, config)
        .with_cancel_flag(cancel)
        .run()
        .await;

    if let Err(e) = client.logout().await {
        debug!("Logout failed: {e}");
    }

    println!("{}", formatter.format_report(&report));

    match report.status {
        RunStatus::Completed => Ok(ExitCode::SUCCESS),
        RunStatus::Aborted { .. } | RunStatus::Cancelled => Ok(ExitCode::FAILURE),
    }
}

/// Lists the reference and target chassis side by side.
async fn cmd_scan(
    plan_path: Option<&std::path::Path>,
    host: Option<String>,
    username: Option<String>,
    snapshot: Option<PathBuf>,
    formatter: &OutputFormatter,
) -> Result<ExitCode> {
    let plan = match plan_path {
        Some(path) => Some(ConfigParser::new().load(path)?),
        None => None,
    };

    let snapshot = snapshot.or_else(|| plan.as_ref().map(|p| p.snapshot.clone()));
    let host = host.or_else(|| plan.as_ref().map(|p| p.target.host.clone()));
    let username = username.or_else(|| plan.as_ref().map(|p| p.target.username.clone()));

    if snapshot.is_none() && host.is_none() {
        return Err(ConfigError::validation_general(
            "Nothing to scan; pass --snapshot and/or --host",
        )
        .into());
    }

    if let Some(snapshot) = snapshot {
        let inventory = ReferenceInventory::load(&snapshot)?;
        for chassis in &inventory.chassis {
            println!("{}", formatter.format_scan("Reference", chassis));
        }
    }

    if let Some(host) = host {
        let username = username.ok_or_else(|| {
            RestoreError::Config(ConfigError::validation_general(
                "Scanning a live device requires --username",
            ))
        })?;
        let password = std::env::var("FOS_PASSWORD")
            .map_err(|_| ConfigError::MissingEnvVar {
                name: String::from("FOS_PASSWORD"),
            })?;

        let client = FosClient::login(&host, &username, &password).await?;
        let state = capture(&client, &CapturePlan::base()).await?;
        if let Err(e) = client.logout().await {
            debug!("Logout failed: {e}");
        }
        println!("{}", formatter.format_scan("Target", &state.chassis));
    }

    Ok(ExitCode::SUCCESS)
}

/// Validates the plan file.
fn cmd_validate(
    plan_path: Option<&std::path::Path>,
    formatter: &OutputFormatter,
) -> Result<ExitCode> {
    let Some(path) = plan_path else {
        return Err(ConfigError::validation_general(
            "Pass --plan to select the plan file to validate",
        )
        .into());
    };

    match ConfigParser::new().load(path) {
        Ok(plan) => {
            formatter.success(&format!(
                "Plan is valid: {} -> {}",
                plan.snapshot.display(),
                plan.target.host
            ));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!("Plan is invalid: {e}");
            Err(e)
        }
    }
}

/// Asks the user for confirmation on the terminal.
fn confirm(prompt: &str) -> bool {
    if !std::io::stdin().is_terminal() {
        // Non-interactive runs must pass --yes explicitly.
        return false;
    }
    eprint!("{prompt}");
    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes")
}
