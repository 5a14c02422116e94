use anyhow::{anyhow, Result};
use asa_provision::config::Settings;
use asa_provision::report::{render_access_groups, render_acl, AccessGroupRow};
use serde::Serialize;

use crate::cli::{ListAclsArgs, OutputFormat, ShowAclArgs};
use crate::open_snapshot;

#[derive(Debug, Serialize)]
struct AclReport<'a> {
    zone: &'a str,
    acl: Option<&'a str>,
    entries: Vec<asa_policy_core::AclEntry>,
}

pub fn run_show_acl(args: ShowAclArgs, settings: &Settings) -> Result<()> {
    let (snapshot, _table) = open_snapshot(&args.snapshot, settings)?;
    let entries = snapshot
        .acl_entries(&args.zone)
        .ok_or_else(|| anyhow!("zone '{}' has no inbound ACL in snapshot", args.zone))?;
    let acl = snapshot.acl_name(&args.zone);

    match args.format {
        OutputFormat::Text => println!("{}", render_acl(&args.zone, acl, &entries)),
        OutputFormat::Json => {
            let report = AclReport {
                zone: &args.zone,
                acl,
                entries,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

pub fn run_list_acls(args: ListAclsArgs, settings: &Settings) -> Result<()> {
    let (snapshot, _table) = open_snapshot(&args.snapshot, settings)?;
    let rows: Vec<AccessGroupRow> = snapshot
        .access_groups()
        .iter()
        .map(|group| AccessGroupRow {
            acl: group.acl.clone(),
            zone: group.zone.clone(),
            direction: group.direction.clone(),
            entries: snapshot.acl_entries(&group.zone).map(|e| e.len()),
        })
        .collect();

    match args.format {
        OutputFormat::Text => println!("{}", render_access_groups(&rows)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
    }
    Ok(())
}
