use anyhow::{Context, Result};
use asa_policy_core::{FieldKey, FieldKind};
use asa_provision::config::Settings;
use serde::Serialize;

use crate::cli::{ClassifyArgs, OutputFormat};

#[derive(Debug, Serialize)]
struct Classification {
    literal: String,
    kind: String,
    wire_kind: &'static str,
    field_key: FieldKey,
}

impl Classification {
    fn new<K: FieldKind + std::fmt::Display>(literal: &str, kind: K) -> Self {
        Self {
            literal: literal.to_string(),
            kind: kind.to_string(),
            wire_kind: kind.wire_kind(literal),
            field_key: kind.field_key(),
        }
    }
}

pub fn run_classify(args: ClassifyArgs, settings: &Settings) -> Result<()> {
    let classifier = settings
        .classifier()
        .with_context(|| "invalid classifier settings")?;

    let rows: Vec<Classification> = args
        .literals
        .iter()
        .map(|literal| {
            if args.service {
                Classification::new(literal, classifier.classify_service(literal))
            } else {
                Classification::new(literal, classifier.classify(literal))
            }
        })
        .collect();

    match args.format {
        OutputFormat::Text => {
            for row in &rows {
                println!(
                    "{} kind={} wire={} key={}",
                    row.literal,
                    row.kind,
                    row.wire_kind,
                    row.field_key.wire_key()
                );
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
    }
    Ok(())
}
