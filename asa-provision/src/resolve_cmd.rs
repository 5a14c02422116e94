use anyhow::{Context, Result};
use asa_policy_core::{
    check_group_homogeneity, resolve_group_zone, AddressKind, ObjectLookup, SessionContext,
};
use asa_provision::config::Settings;
use asa_provision::report::{render_group_zone, render_route};
use serde::Serialize;

use crate::cli::{GroupZoneArgs, OutputFormat, ResolveArgs};
use crate::open_snapshot;

pub fn run_resolve(args: ResolveArgs, settings: &Settings) -> Result<()> {
    let (snapshot, table) = open_snapshot(&args.snapshot, settings)?;
    let ctx = SessionContext::new(snapshot_name(&args.snapshot));

    // Named objects resolve through the address they stand for.
    let address = if table.classifier().classify(&args.address) == AddressKind::ObjectReference {
        snapshot
            .object_address(&ctx, &args.address)
            .with_context(|| format!("failed to look up object {}", args.address))?
    } else {
        args.address.clone()
    };
    let route = table
        .resolve_zone(&address)
        .with_context(|| format!("failed to resolve zone of {}", args.address))?;

    match args.format {
        OutputFormat::Text => println!("{}", render_route(&args.address, route)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(route)?),
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct GroupZoneReport<'a> {
    #[serde(flatten)]
    zone: &'a asa_policy_core::GroupZone,
    mismatches: &'a [asa_policy_core::ZoneMismatch],
}

pub fn run_group_zone(args: GroupZoneArgs, settings: &Settings) -> Result<()> {
    let (snapshot, table) = open_snapshot(&args.snapshot, settings)?;
    let ctx = SessionContext::new(snapshot_name(&args.snapshot));

    let members = snapshot
        .group_members(&ctx, &args.group)
        .with_context(|| format!("failed to look up group {}", args.group))?;
    let zone = resolve_group_zone(&ctx, &args.group, &members, &table, &snapshot)
        .with_context(|| format!("failed to resolve zone of group {}", args.group))?;
    let mismatches = if args.check_members || settings.pipeline.verify_group_homogeneity {
        check_group_homogeneity(&ctx, &args.group, &members, &table, &snapshot)
    } else {
        Vec::new()
    };

    match args.format {
        OutputFormat::Text => println!("{}", render_group_zone(&zone, &mismatches)),
        OutputFormat::Json => {
            let report = GroupZoneReport {
                zone: &zone,
                mismatches: &mismatches,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

pub(crate) fn snapshot_name(dir: &std::path::Path) -> String {
    dir.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("snapshot")
        .to_string()
}
