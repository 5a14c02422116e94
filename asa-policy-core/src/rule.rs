//! Inbound ACL rules: construction, wire encoding and decoding.
//!
//! The management API uses two different keys for the same concept: a
//! literal address or service goes in `value`, a named object goes in
//! `objectId`. [`RuleField`] stores the literal in a [`FieldSlot`] chosen from
//! the field's kind at construction, so a rule can never carry a reference in
//! the `value` slot or the other way round.

use serde::{Deserialize, Serialize};

use crate::classify::{AddressKind, FieldKey, FieldKind, ServiceKind};
use crate::wire::WireValue;

pub const DEFAULT_LOG_INTERVAL: u32 = 300;
pub const DEFAULT_LOG_STATUS: &str = "Informational";

/// The one populated payload slot of a rule field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldSlot {
    Value(String),
    ObjectId(String),
}

/// A typed source, destination or service field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleField<K> {
    kind: K,
    slot: FieldSlot,
}

pub type AddressField = RuleField<AddressKind>;
pub type ServiceField = RuleField<ServiceKind>;

impl<K: FieldKind> RuleField<K> {
    pub fn new(kind: K, literal: impl Into<String>) -> Self {
        let literal = literal.into().trim().to_string();
        let slot = match kind.field_key() {
            FieldKey::ByValue => FieldSlot::Value(literal),
            FieldKey::ByReference => FieldSlot::ObjectId(literal),
        };
        Self { kind, slot }
    }

    pub fn kind(&self) -> K {
        self.kind
    }

    pub fn slot(&self) -> &FieldSlot {
        &self.slot
    }

    pub fn literal(&self) -> &str {
        match &self.slot {
            FieldSlot::Value(v) | FieldSlot::ObjectId(v) => v,
        }
    }

    pub fn to_wire(&self) -> WireValue {
        let kind = self.kind.wire_kind(self.literal());
        match &self.slot {
            FieldSlot::Value(v) => WireValue::by_value(kind, v.clone()),
            FieldSlot::ObjectId(id) => WireValue::by_reference(kind, id.clone()),
        }
    }
}

/// Syslog settings attached to each new rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleLogging {
    pub log_interval: u32,
    pub log_status: String,
}

impl Default for RuleLogging {
    fn default() -> Self {
        Self {
            log_interval: DEFAULT_LOG_INTERVAL,
            log_status: DEFAULT_LOG_STATUS.to_string(),
        }
    }
}

/// One inbound ACL rule ready for submission.
///
/// `position` is 1-based. The implicit deny-all terminal rule is never
/// represented; a rule is always placed before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclRule {
    source: AddressField,
    destination: AddressField,
    service: ServiceField,
    remark: String,
    position: u32,
    permit: bool,
    logging: RuleLogging,
}

impl AclRule {
    pub fn source(&self) -> &AddressField {
        &self.source
    }

    pub fn destination(&self) -> &AddressField {
        &self.destination
    }

    pub fn service(&self) -> &ServiceField {
        &self.service
    }

    pub fn remark(&self) -> &str {
        &self.remark
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn permit(&self) -> bool {
        self.permit
    }

    pub fn logging(&self) -> &RuleLogging {
        &self.logging
    }

    /// Turn the rule into a deny rule.
    pub fn deny(mut self) -> Self {
        self.permit = false;
        self
    }

    /// Payload for `POST access/in/<zone>/rules`.
    pub fn to_wire(&self) -> WireRule {
        WireRule {
            source_address: self.source.to_wire(),
            destination_address: self.destination.to_wire(),
            destination_service: self.service.to_wire(),
            rule_logging: self.logging.clone(),
            permit: self.permit,
            remarks: if self.remark.is_empty() {
                Vec::new()
            } else {
                vec![self.remark.clone()]
            },
            position: self.position,
        }
    }
}

/// Builds [`AclRule`]s; holds the settings shared by every rule of a run.
#[derive(Debug, Clone, Default)]
pub struct AclRuleBuilder {
    logging: RuleLogging,
}

impl AclRuleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_logging(mut self, logging: RuleLogging) -> Self {
        self.logging = logging;
        self
    }

    /// Build a permit rule. Positions below 1 are raised to 1.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        &self,
        src_kind: AddressKind,
        src: &str,
        dst_kind: AddressKind,
        dst: &str,
        svc_kind: ServiceKind,
        svc: &str,
        remark: &str,
        position: u32,
    ) -> AclRule {
        AclRule {
            source: RuleField::new(src_kind, src),
            destination: RuleField::new(dst_kind, dst),
            service: RuleField::new(svc_kind, svc),
            remark: remark.trim().to_string(),
            position: position.max(1),
            permit: true,
            logging: self.logging.clone(),
        }
    }
}

/// JSON body of a rule submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRule {
    pub source_address: WireValue,
    pub destination_address: WireValue,
    pub destination_service: WireValue,
    pub rule_logging: RuleLogging,
    pub permit: bool,
    pub remarks: Vec<String>,
    pub position: u32,
}

/// One existing entry of an inbound ACL as the rules endpoint lists it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAce {
    pub position: u32,
    #[serde(default = "default_true")]
    pub permit: bool,
    #[serde(default = "default_true")]
    pub active: bool,
    pub source_address: WireValue,
    pub destination_address: WireValue,
    pub destination_service: WireValue,
    #[serde(default)]
    pub remarks: Vec<String>,
    #[serde(default)]
    pub object_id: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Decoded ACL entry with every field reduced to its literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AclEntry {
    pub position: u32,
    pub permission: String,
    pub active: bool,
    pub source: String,
    pub destination: String,
    pub service: String,
    pub remarks: Vec<String>,
}

impl From<&WireAce> for AclEntry {
    fn from(ace: &WireAce) -> Self {
        let literal = |w: &WireValue| w.literal().unwrap_or_default().to_string();
        Self {
            position: ace.position,
            permission: if ace.permit { "permit" } else { "deny" }.to_string(),
            active: ace.active,
            source: literal(&ace.source_address),
            destination: literal(&ace.destination_address),
            service: literal(&ace.destination_service),
            remarks: ace.remarks.clone(),
        }
    }
}

impl From<&AclRule> for AclEntry {
    fn from(rule: &AclRule) -> Self {
        Self {
            position: rule.position,
            permission: if rule.permit { "permit" } else { "deny" }.to_string(),
            active: true,
            source: rule.source.literal().to_string(),
            destination: rule.destination.literal().to_string(),
            service: rule.service.literal().to_string(),
            remarks: rule.to_wire().remarks,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{AclEntry, AclRuleBuilder, FieldSlot, RuleField, RuleLogging, WireAce};
    use crate::classify::{AddressKind, ServiceKind};

    #[test]
    fn references_populate_object_id_slot() {
        let field = RuleField::new(AddressKind::GroupReference, "grp-web-servers");
        assert_eq!(field.slot(), &FieldSlot::ObjectId("grp-web-servers".to_string()));
        let field = RuleField::new(AddressKind::Host, "10.1.4.28");
        assert_eq!(field.slot(), &FieldSlot::Value("10.1.4.28".to_string()));
    }

    #[test]
    fn builds_wire_payload() {
        let rule = AclRuleBuilder::new().build(
            AddressKind::Host,
            "10.1.4.28",
            AddressKind::ObjectReference,
            "webhost",
            ServiceKind::TcpUdp,
            "tcp/80",
            "Approved Ticket: 5678",
            20,
        );
        let payload = serde_json::to_value(rule.to_wire()).expect("json");
        assert_eq!(
            payload,
            json!({
                "sourceAddress": {"kind": "IPv4Address", "value": "10.1.4.28"},
                "destinationAddress": {"kind": "objectRef#NetworkObj", "objectId": "webhost"},
                "destinationService": {"kind": "TcpUdpService", "value": "tcp/80"},
                "ruleLogging": {"logInterval": 300, "logStatus": "Informational"},
                "permit": true,
                "remarks": ["Approved Ticket: 5678"],
                "position": 20
            })
        );
    }

    #[test]
    fn position_is_never_zero_and_deny_is_available() {
        let rule = AclRuleBuilder::new()
            .with_logging(RuleLogging {
                log_interval: 60,
                log_status: "Debugging".to_string(),
            })
            .build(
                AddressKind::Any,
                "any4",
                AddressKind::Any,
                "any4",
                ServiceKind::Protocol,
                "ip",
                "",
                0,
            )
            .deny();
        assert_eq!(rule.position(), 1);
        assert!(!rule.permit());
        assert_eq!(rule.logging().log_interval, 60);
        assert!(rule.to_wire().remarks.is_empty());
    }

    #[test]
    fn decodes_existing_entries() {
        let ace: WireAce = serde_json::from_value(json!({
            "active": false,
            "destinationAddress": {"kind": "AnyIPAddress", "value": "any4"},
            "destinationService": {"kind": "NetworkProtocol", "value": "ip"},
            "isAccessRule": true,
            "kind": "object#ExtendedACE",
            "objectId": "1559360646",
            "permit": true,
            "position": 1,
            "remarks": ["Rule has been disabled"],
            "sourceAddress": {"kind": "objectRef#NetworkObj", "objectId": "partner-network"},
            "sourceService": {"kind": "NetworkProtocol", "value": "ip"}
        }))
        .expect("ace");
        let entry = AclEntry::from(&ace);
        assert_eq!(entry.permission, "permit");
        assert_eq!(entry.source, "partner-network");
        assert_eq!(entry.destination, "any");
        assert_eq!(entry.service, "ip");
        assert!(!entry.active);
    }
}
