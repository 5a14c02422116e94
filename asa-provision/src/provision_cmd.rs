use std::fs;
use std::ops::ControlFlow;

use anyhow::{bail, Context, Result};
use asa_policy_core::{AclRuleBuilder, ProvisioningPipeline, SessionContext};
use asa_provision::config::Settings;
use asa_provision::report::{render_row, render_summary, ProvisionReport, ReportRow};
use asa_provision::rule_list::read_rule_list;

use crate::cli::{OutputFormat, ProvisionArgs};
use crate::open_snapshot;
use crate::resolve_cmd::snapshot_name;

pub fn run_provision(args: ProvisionArgs, settings: &Settings, config_source: &str) -> Result<()> {
    let (snapshot, table) = open_snapshot(&args.snapshot, settings)?;
    let requests = read_rule_list(&args.rules)
        .with_context(|| format!("failed to read rule list {}", args.rules.display()))?;
    let appliance = args
        .appliance
        .clone()
        .unwrap_or_else(|| snapshot_name(&args.snapshot));
    let ctx = SessionContext::new(appliance.as_str());

    let pipeline = ProvisioningPipeline::new(&ctx, &table, &snapshot, &snapshot, &snapshot)
        .with_builder(AclRuleBuilder::new().with_logging(settings.rule_logging()))
        .with_options(settings.pipeline_options());

    let text = matches!(args.format, OutputFormat::Text);
    let mut rows = Vec::with_capacity(requests.len());
    pipeline.run_each(&requests, |outcome| {
        let acl = outcome.zone.as_deref().and_then(|z| snapshot.acl_name(z));
        let row = ReportRow::from_outcome(outcome, acl);
        if text {
            println!("{}", render_row(&row));
        }
        let stop = args.fail_fast && !row.is_success();
        rows.push(row);
        if stop {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });

    let report = ProvisionReport::new(&appliance, config_source, rows);
    match args.format {
        OutputFormat::Text => println!("{}", render_summary(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if let Some(path) = &args.payloads {
        let payloads = serde_json::to_string_pretty(&snapshot.submitted())?;
        fs::write(path, payloads)
            .with_context(|| format!("failed to write payloads file {}", path.display()))?;
    }

    if args.fail_fast && report.failed > 0 {
        bail!("provisioning stopped at first failure");
    }
    if args.strict && report.failed > 0 {
        bail!("provisioning failed in strict mode: {} failed rows", report.failed);
    }
    Ok(())
}
