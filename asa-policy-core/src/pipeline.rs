//! Batch provisioning of inbound ACL rules.
//!
//! Each request walks `Pending → ZoneResolved → PositionComputed → Built →
//! Submitted → Succeeded | Failed`. A failing row is recorded and the batch
//! moves on; nothing already submitted is rolled back. Rows run strictly in
//! input order because every insertion moves the last position of its zone,
//! which the next row targeting that zone reads.

use std::ops::ControlFlow;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::capability::{
    ObjectLookup, PositionError, PositionSource, SessionContext, SubmitOutcome, Submitter,
};
use crate::classify::AddressKind;
use crate::group::{check_group_homogeneity, resolve_group_zone, ZoneMismatch, ZoneResolutionError};
use crate::route::RouteTable;
use crate::rule::{AclRule, AclRuleBuilder};

/// One row of intended policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisioningRequest {
    pub source: String,
    pub destination: String,
    pub service: String,
    pub remark: String,
}

/// Lifecycle stage of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowStage {
    Pending,
    ZoneResolved,
    PositionComputed,
    Built,
    Submitted,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("zone resolution failed: {0}")]
    ZoneResolution(#[from] ZoneResolutionError),
    #[error("zone '{zone}' has no inbound ACL")]
    ZoneNotFound { zone: String },
    #[error("could not read inbound ACL for zone '{zone}': {reason}")]
    PositionUnavailable { zone: String, reason: String },
    #[error("appliance rejected rule: status {status_code} {reason}")]
    RemoteRejection {
        status_code: u16,
        reason: String,
        content: String,
    },
}

impl FailureReason {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::ZoneResolution(_) => "zone_resolution_error",
            FailureReason::ZoneNotFound { .. } => "zone_not_found",
            FailureReason::PositionUnavailable { .. } => "position_unavailable",
            FailureReason::RemoteRejection { .. } => "remote_rejection",
        }
    }
}

impl From<PositionError> for FailureReason {
    fn from(err: PositionError) -> Self {
        match err {
            PositionError::ZoneNotFound { zone } => FailureReason::ZoneNotFound { zone },
            PositionError::Unavailable { zone, reason } => {
                FailureReason::PositionUnavailable { zone, reason }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowStatus {
    Succeeded(SubmitOutcome),
    /// `stage` is the last stage the row reached before failing.
    Failed {
        stage: RowStage,
        reason: FailureReason,
    },
}

/// Result of one request; `row` is the 0-based index into the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowOutcome {
    pub row: usize,
    pub request: ProvisioningRequest,
    pub zone: Option<String>,
    pub rule: Option<AclRule>,
    pub status: RowStatus,
    pub warnings: Vec<ZoneMismatch>,
}

impl RowOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, RowStatus::Succeeded(_))
    }

    pub fn stage(&self) -> RowStage {
        match self.status {
            RowStatus::Succeeded(_) => RowStage::Succeeded,
            RowStatus::Failed { .. } => RowStage::Failed,
        }
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match &self.status {
            RowStatus::Failed { reason, .. } => Some(reason),
            RowStatus::Succeeded(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineOptions {
    /// Resolve every member of a source group and warn when they span zones.
    pub verify_group_homogeneity: bool,
}

/// Drives a batch of [`ProvisioningRequest`]s against the capabilities.
pub struct ProvisioningPipeline<'a> {
    ctx: &'a SessionContext,
    table: &'a RouteTable,
    lookup: &'a dyn ObjectLookup,
    positions: &'a dyn PositionSource,
    submitter: &'a dyn Submitter,
    builder: AclRuleBuilder,
    options: PipelineOptions,
}

impl<'a> ProvisioningPipeline<'a> {
    pub fn new(
        ctx: &'a SessionContext,
        table: &'a RouteTable,
        lookup: &'a dyn ObjectLookup,
        positions: &'a dyn PositionSource,
        submitter: &'a dyn Submitter,
    ) -> Self {
        Self {
            ctx,
            table,
            lookup,
            positions,
            submitter,
            builder: AclRuleBuilder::new(),
            options: PipelineOptions::default(),
        }
    }

    pub fn with_builder(mut self, builder: AclRuleBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Process every request; returns one outcome per request in input order.
    pub fn run(&self, requests: &[ProvisioningRequest]) -> Vec<RowOutcome> {
        self.run_each(requests, |_| ControlFlow::Continue(()))
    }

    /// Like [`run`](Self::run), but reports each outcome as it completes.
    ///
    /// Returning `ControlFlow::Break` stops before the next request is issued;
    /// the outcomes gathered so far are returned.
    pub fn run_each<F>(&self, requests: &[ProvisioningRequest], mut on_outcome: F) -> Vec<RowOutcome>
    where
        F: FnMut(&RowOutcome) -> ControlFlow<()>,
    {
        let mut outcomes = Vec::with_capacity(requests.len());
        for (row, request) in requests.iter().enumerate() {
            let outcome = self.process(row, request);
            let flow = on_outcome(&outcome);
            outcomes.push(outcome);
            if flow.is_break() {
                info!(
                    processed = outcomes.len(),
                    total = requests.len(),
                    "batch stopped by caller"
                );
                break;
            }
        }

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        info!(
            appliance = %self.ctx.appliance,
            succeeded,
            failed = outcomes.len() - succeeded,
            "provisioning batch finished"
        );
        outcomes
    }

    fn process(&self, row: usize, request: &ProvisioningRequest) -> RowOutcome {
        let mut progress = RowProgress::default();
        let status = match self.advance(row, request, &mut progress) {
            Ok(submitted) => RowStatus::Succeeded(submitted),
            Err((stage, reason)) => {
                warn!(
                    row,
                    source = %request.source,
                    stage = ?stage,
                    code = reason.code(),
                    "request failed: {reason}"
                );
                RowStatus::Failed { stage, reason }
            }
        };

        RowOutcome {
            row,
            request: request.clone(),
            zone: progress.zone,
            rule: progress.rule,
            status,
            warnings: progress.warnings,
        }
    }

    fn advance(
        &self,
        row: usize,
        request: &ProvisioningRequest,
        progress: &mut RowProgress,
    ) -> Result<SubmitOutcome, (RowStage, FailureReason)> {
        debug!(row, source = %request.source, stage = ?RowStage::Pending, "processing request");
        let classifier = self.table.classifier();
        let src_kind = classifier.classify(&request.source);

        let (zone, warnings) = self
            .resolve_source_zone(&request.source, src_kind)
            .map_err(|err| (RowStage::Pending, FailureReason::from(err)))?;
        progress.zone = Some(zone.clone());
        progress.warnings = warnings;
        debug!(row, zone = %zone, stage = ?RowStage::ZoneResolved, "zone resolved");

        // Inserting at the current last position pushes that rule down one
        // slot, so the new rule lands just above it and above the implicit deny.
        let position = self
            .positions
            .last_position(self.ctx, &zone)
            .map_err(|err| (RowStage::ZoneResolved, FailureReason::from(err)))?;
        debug!(row, position, stage = ?RowStage::PositionComputed, "position computed");

        let rule = self.builder.build(
            src_kind,
            &request.source,
            classifier.classify(&request.destination),
            &request.destination,
            classifier.classify_service(&request.service),
            &request.service,
            &request.remark,
            position,
        );
        debug!(row, stage = ?RowStage::Built, "rule built");

        let submitted = self.submitter.submit(self.ctx, &zone, &rule);
        progress.rule = Some(rule);
        debug!(row, status = submitted.status_code, stage = ?RowStage::Submitted, "rule submitted");
        if submitted.ok {
            return Ok(submitted);
        }
        Err((
            RowStage::Submitted,
            FailureReason::RemoteRejection {
                status_code: submitted.status_code,
                reason: submitted.reason,
                content: submitted.content,
            },
        ))
    }

    fn resolve_source_zone(
        &self,
        source: &str,
        kind: AddressKind,
    ) -> Result<(String, Vec<ZoneMismatch>), ZoneResolutionError> {
        match kind {
            AddressKind::GroupReference => {
                let members = self.lookup.group_members(self.ctx, source)?;
                let assigned = resolve_group_zone(self.ctx, source, &members, self.table, self.lookup)?;
                let warnings = if self.options.verify_group_homogeneity {
                    check_group_homogeneity(self.ctx, source, &members, self.table, self.lookup)
                } else {
                    Vec::new()
                };
                Ok((assigned.zone, warnings))
            }
            AddressKind::ObjectReference => {
                let address = self.lookup.object_address(self.ctx, source)?;
                let route = self.table.resolve_zone(&address)?;
                Ok((route.zone().to_string(), Vec::new()))
            }
            _ => {
                let route = self.table.resolve_zone(source)?;
                Ok((route.zone().to_string(), Vec::new()))
            }
        }
    }
}

/// What a row accumulated before it finished or failed.
#[derive(Default)]
struct RowProgress {
    zone: Option<String>,
    rule: Option<AclRule>,
    warnings: Vec<ZoneMismatch>,
}

#[cfg(test)]
mod tests {
    use super::{FailureReason, ProvisioningRequest, RowOutcome, RowStage, RowStatus};
    use crate::capability::{PositionError, SubmitOutcome};

    fn request() -> ProvisioningRequest {
        ProvisioningRequest {
            source: "grp-a".to_string(),
            destination: "grp-b".to_string(),
            service: "grp-tcp-https".to_string(),
            remark: "RITM00029".to_string(),
        }
    }

    #[test]
    fn position_errors_map_to_flat_reasons() {
        let reason: FailureReason = PositionError::ZoneNotFound {
            zone: "lab".to_string(),
        }
        .into();
        assert_eq!(reason, FailureReason::ZoneNotFound { zone: "lab".to_string() });
        assert_eq!(reason.code(), "zone_not_found");
    }

    #[test]
    fn outcome_stage_reflects_status() {
        let ok = RowOutcome {
            row: 0,
            request: request(),
            zone: Some("lab".to_string()),
            rule: None,
            status: RowStatus::Succeeded(SubmitOutcome::created()),
            warnings: Vec::new(),
        };
        assert!(ok.is_success());
        assert_eq!(ok.stage(), RowStage::Succeeded);
        assert!(ok.failure().is_none());

        let failed = RowOutcome {
            status: RowStatus::Failed {
                stage: RowStage::Submitted,
                reason: FailureReason::RemoteRejection {
                    status_code: 400,
                    reason: "Bad Request".to_string(),
                    content: "{}".to_string(),
                },
            },
            ..ok
        };
        assert_eq!(failed.stage(), RowStage::Failed);
        assert_eq!(failed.failure().map(FailureReason::code), Some("remote_rejection"));
    }
}
