use std::io::Read;
use std::path::Path;

use asa_policy_core::ProvisioningRequest;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleListError {
    #[error("failed to open rule list {path}: {source}")]
    Open { path: String, source: csv::Error },
    #[error("rule list line {line}: {source}")]
    Row { line: u64, source: csv::Error },
}

/// One CSV row. Headers are matched exactly; extra columns are ignored.
#[derive(Debug, Deserialize)]
struct RuleRow {
    #[serde(rename = "Source")]
    source: String,
    #[serde(rename = "Destination")]
    destination: String,
    #[serde(rename = "Protocol")]
    protocol: String,
    #[serde(rename = "Remark", default)]
    remark: String,
}

impl From<RuleRow> for ProvisioningRequest {
    fn from(row: RuleRow) -> Self {
        ProvisioningRequest {
            source: row.source.trim().to_string(),
            destination: row.destination.trim().to_string(),
            service: row.protocol.trim().to_string(),
            remark: row.remark.trim().to_string(),
        }
    }
}

pub fn read_rule_list(path: &Path) -> Result<Vec<ProvisioningRequest>, RuleListError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(|source| RuleListError::Open {
            path: path.display().to_string(),
            source,
        })?;
    collect_rows(reader)
}

pub fn parse_rule_list<R: Read>(input: R) -> Result<Vec<ProvisioningRequest>, RuleListError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(input);
    collect_rows(reader)
}

fn collect_rows<R: Read>(
    mut reader: csv::Reader<R>,
) -> Result<Vec<ProvisioningRequest>, RuleListError> {
    let mut out = Vec::new();
    for record in reader.deserialize::<RuleRow>() {
        let row = record.map_err(|source| RuleListError::Row {
            line: source.position().map(|p| p.line()).unwrap_or(0),
            source,
        })?;
        // Rows left blank by spreadsheet exports.
        if row.source.trim().is_empty() && row.destination.trim().is_empty() {
            continue;
        }
        out.push(row.into());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use asa_policy_core::ProvisioningRequest;
    use pretty_assertions::assert_eq;

    use super::{parse_rule_list, RuleListError};

    #[test]
    fn reads_rows_and_ignores_extra_columns() {
        let input = "\
Source,Destination,Protocol,Remark,Ticket
grp-app-servers, 10.2.2.2 ,tcp/443,RITM001,CHG9
192.168.6.5,any4,ip,,CHG9
,,,,
";
        let rows = parse_rule_list(input.as_bytes()).expect("parse");
        assert_eq!(
            rows,
            vec![
                ProvisioningRequest {
                    source: "grp-app-servers".to_string(),
                    destination: "10.2.2.2".to_string(),
                    service: "tcp/443".to_string(),
                    remark: "RITM001".to_string(),
                },
                ProvisioningRequest {
                    source: "192.168.6.5".to_string(),
                    destination: "any4".to_string(),
                    service: "ip".to_string(),
                    remark: String::new(),
                },
            ]
        );
    }

    #[test]
    fn remark_column_is_optional() {
        let rows = parse_rule_list("Source,Destination,Protocol\n10.1.1.1,any4,ip\n".as_bytes())
            .expect("parse");
        assert_eq!(rows[0].remark, "");
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let err = parse_rule_list("Source,Destination\n10.1.1.1,any4\n".as_bytes()).unwrap_err();
        assert!(matches!(err, RuleListError::Row { .. }));
    }
}
