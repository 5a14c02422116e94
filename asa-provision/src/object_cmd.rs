use anyhow::{Context, Result};
use asa_policy_core::NetworkObjectDraft;
use asa_provision::config::Settings;

use crate::cli::{NameObjectArgs, OutputFormat};
use crate::open_snapshot;

pub fn run_name_object(args: NameObjectArgs, settings: &Settings) -> Result<()> {
    let (_snapshot, table) = open_snapshot(&args.snapshot, settings)?;
    let draft = NetworkObjectDraft::for_literal(&args.literal, &args.description, &table)
        .with_context(|| format!("failed to name object for {}", args.literal))?;

    match args.format {
        OutputFormat::Text => {
            println!("{} zone={} kind={}", draft.name, draft.zone, draft.host.kind);
            println!("{}", serde_json::to_string_pretty(&draft)?);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&draft)?),
    }
    Ok(())
}
