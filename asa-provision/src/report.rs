use asa_policy_core::{
    AclEntry, FailureReason, GroupZone, RouteEntry, RowOutcome, RowStage, RowStatus, ZoneMismatch,
};
use colored::Colorize;
use serde::Serialize;

/// Final result of a row, serialized as `succeeded` or `failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowResult {
    Succeeded,
    Failed,
}

/// One provisioned row as reported to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    /// 1-based, matching the data line of the rule list.
    pub row: usize,
    pub source: String,
    pub destination: String,
    pub service: String,
    pub zone: Option<String>,
    pub acl: Option<String>,
    pub position: Option<u32>,
    pub status: RowResult,
    pub stage: RowStage,
    pub code: Option<String>,
    pub message: Option<String>,
    pub status_code: Option<u16>,
    pub reason: Option<String>,
    pub content: Option<String>,
    pub warnings: Vec<ZoneMismatch>,
}

impl ReportRow {
    pub fn from_outcome(outcome: &RowOutcome, acl: Option<&str>) -> Self {
        let (stage, failure, response) = match &outcome.status {
            RowStatus::Succeeded(response) => (RowStage::Succeeded, None, Some(response.clone())),
            RowStatus::Failed { stage, reason } => (*stage, Some(reason), None),
        };
        let (status_code, reason, content) = match (failure, response) {
            (
                Some(FailureReason::RemoteRejection {
                    status_code,
                    reason,
                    content,
                }),
                _,
            ) => (Some(*status_code), Some(reason.clone()), Some(content.clone())),
            (_, Some(response)) => (
                Some(response.status_code),
                Some(response.reason),
                Some(response.content).filter(|c| !c.is_empty()),
            ),
            _ => (None, None, None),
        };

        Self {
            row: outcome.row + 1,
            source: outcome.request.source.clone(),
            destination: outcome.request.destination.clone(),
            service: outcome.request.service.clone(),
            zone: outcome.zone.clone(),
            acl: acl.map(str::to_string),
            position: outcome.rule.as_ref().map(|r| r.position()),
            status: if outcome.is_success() {
                RowResult::Succeeded
            } else {
                RowResult::Failed
            },
            stage,
            code: failure.map(|f| f.code().to_string()),
            message: failure.map(|f| f.to_string()),
            status_code,
            reason,
            content,
            warnings: outcome.warnings.clone(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RowResult::Succeeded
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    pub appliance: String,
    pub config_source: String,
    pub rows: Vec<ReportRow>,
    pub succeeded: usize,
    pub failed: usize,
}

impl ProvisionReport {
    pub fn new(appliance: &str, config_source: &str, rows: Vec<ReportRow>) -> Self {
        let succeeded = rows.iter().filter(|r| r.is_success()).count();
        Self {
            appliance: appliance.to_string(),
            config_source: config_source.to_string(),
            failed: rows.len() - succeeded,
            succeeded,
            rows,
        }
    }
}

/// Render one row the way operators read it from the console.
pub fn render_row(row: &ReportRow) -> String {
    let mut out = Vec::new();
    out.push(format!(
        "row {}: {} -> {} {} zone={} acl={} position={}",
        row.row,
        row.source,
        row.destination,
        row.service,
        row.zone.as_deref().unwrap_or("none"),
        row.acl.as_deref().unwrap_or("none"),
        row.position
            .map(|p| p.to_string())
            .unwrap_or_else(|| "none".to_string()),
    ));

    if row.is_success() {
        let line = format!(
            "POST ACL CONFIG STATUS_CODE: {} {}",
            row.status_code.unwrap_or(201),
            row.reason.as_deref().unwrap_or("OK")
        );
        out.push(line.green().to_string());
    } else if let Some(code) = row.status_code {
        let line = format!(
            "POST ACL CONFIG FAILED!!! STATUS_CODE: {code} Reason: {} Content: {}",
            row.reason.as_deref().unwrap_or(""),
            row.content.as_deref().unwrap_or("")
        );
        out.push(line.red().to_string());
    } else {
        let line = format!(
            "FAILED stage={:?} code={} {}",
            row.stage,
            row.code.as_deref().unwrap_or("unknown"),
            row.message.as_deref().unwrap_or("")
        );
        out.push(line.red().to_string());
    }

    for warning in &row.warnings {
        out.push(render_mismatch(warning).yellow().to_string());
    }
    out.join("\n")
}

pub fn render_summary(report: &ProvisionReport) -> String {
    format!(
        "result rows={} succeeded={} failed={}",
        report.rows.len(),
        report.succeeded,
        report.failed
    )
    .cyan()
    .to_string()
}

pub fn render_mismatch(warning: &ZoneMismatch) -> String {
    format!(
        "WARN zone_mismatch group={} member={} expected={} found={}",
        warning.group,
        warning.member,
        warning.expected,
        warning.found.as_deref().unwrap_or("unresolved")
    )
}

pub fn render_route(address: &str, route: &RouteEntry) -> String {
    format!(
        "{address} zone={} route={} gateway={} interface={}",
        route.zone(),
        route.destination(),
        route.gateway(),
        route.hardware()
    )
}

pub fn render_group_zone(zone: &GroupZone, warnings: &[ZoneMismatch]) -> String {
    let mut out = vec![format!(
        "{} zone={} via={} route={}",
        zone.group,
        zone.zone,
        zone.address,
        zone.route.destination()
    )];
    for warning in warnings {
        out.push(render_mismatch(warning).yellow().to_string());
    }
    out.join("\n")
}

/// One access group with the size of its ACL, when the snapshot carries it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessGroupRow {
    pub acl: String,
    pub zone: String,
    pub direction: String,
    pub entries: Option<usize>,
}

pub fn render_access_groups(rows: &[AccessGroupRow]) -> String {
    let mut out = vec![format!("access_groups count={}", rows.len())];
    if rows.is_empty() {
        out.push("- none".to_string());
    }
    for row in rows {
        let entries = row
            .entries
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        out.push(format!(
            "- {} zone={} direction={} entries={entries}",
            row.acl, row.zone, row.direction
        ));
    }
    out.join("\n")
}

pub fn render_acl(zone: &str, acl: Option<&str>, entries: &[AclEntry]) -> String {
    let mut out = vec![format!(
        "acl zone={zone} name={} entries={}",
        acl.unwrap_or("none"),
        entries.len()
    )];
    if entries.is_empty() {
        out.push("- none".to_string());
    }
    for entry in entries {
        let mut line = format!(
            "{:>4} {} {} -> {} {}",
            entry.position, entry.permission, entry.source, entry.destination, entry.service
        );
        if !entry.active {
            line.push_str(" (inactive)");
        }
        if !entry.remarks.is_empty() {
            line.push_str(&format!(" # {}", entry.remarks.join("; ")));
        }
        out.push(line);
    }
    out.join("\n")
}
