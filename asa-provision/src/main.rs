use std::path::Path;

use anyhow::{Context, Result};
use asa_policy_core::RouteTable;
use asa_provision::config::{load_settings, Settings};
use asa_provision::snapshot::ApplianceSnapshot;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod acl_cmd;
mod classify_cmd;
mod cli;
mod object_cmd;
mod provision_cmd;
mod resolve_cmd;

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (settings, config_source) = load_settings(cli.config.as_deref())
        .with_context(|| "failed to load settings")?;
    debug!(source = %config_source, "settings loaded");

    match cli.command {
        Command::Classify(args) => classify_cmd::run_classify(args, &settings),
        Command::Resolve(args) => resolve_cmd::run_resolve(args, &settings),
        Command::GroupZone(args) => resolve_cmd::run_group_zone(args, &settings),
        Command::Provision(args) => provision_cmd::run_provision(args, &settings, &config_source),
        Command::NameObject(args) => object_cmd::run_name_object(args, &settings),
        Command::ShowAcl(args) => acl_cmd::run_show_acl(args, &settings),
        Command::ListAcls(args) => acl_cmd::run_list_acls(args, &settings),
    }
}

/// Logs go to stderr so stdout stays parseable.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load a snapshot and the route table built from it with the configured classifier.
fn open_snapshot(dir: &Path, settings: &Settings) -> Result<(ApplianceSnapshot, RouteTable)> {
    let classifier = settings
        .classifier()
        .with_context(|| "invalid classifier settings")?;
    let snapshot = ApplianceSnapshot::load(dir, classifier)
        .with_context(|| format!("failed to load snapshot {}", dir.display()))?;
    let table = snapshot
        .route_table(&settings.routing.management_zone)
        .with_context(|| format!("failed to parse routes in {}", dir.display()))?;
    Ok((snapshot, table))
}
