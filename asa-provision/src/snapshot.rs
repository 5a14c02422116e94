//! Saved appliance state and dry-run capabilities backed by it.
//!
//! A snapshot directory holds the JSON bodies of the management API's list
//! endpoints, one file per endpoint:
//!
//! | file                         | endpoint                          | required |
//! |------------------------------|-----------------------------------|----------|
//! | `routes.json`                | `routing/static`                  | yes      |
//! | `networkobjects.json`        | `objects/networkobjects`          | no       |
//! | `networkobjectgroups.json`   | `objects/networkobjectgroups`     | no       |
//! | `networkservicegroups.json`  | `objects/networkservicegroups`    | no       |
//! | `access_groups.json`         | `access/in`                       | no       |
//! | `acls/<zone>.json`           | `access/in/<zone>/rules`          | no       |
//!
//! [`ApplianceSnapshot`] answers object lookups and position queries from
//! those files and accepts submissions the way the appliance would: unknown
//! references, malformed addresses and out-of-range positions are rejected
//! with an API-style error body, accepted rules are inserted so later rows
//! see the shifted positions.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use asa_policy_core::{
    AclEntry, AclRule, AddressClassifier, AddressKind, GroupMember, ItemList, LookupError,
    ObjectLookup, PositionError, PositionSource, RawRoute, RouteParseError, RouteTable,
    RuleField, ServiceKind, SessionContext, SubmitOutcome, Submitter, WireAce, WireRule,
    WireValue,
};
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse snapshot file {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireNetworkObject {
    #[serde(default)]
    object_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    host: WireValue,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireObjectGroup {
    #[serde(default)]
    object_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    members: Vec<GroupMember>,
}

#[derive(Debug, Clone, Deserialize)]
struct WireAccessGroup {
    #[serde(rename = "ACLName")]
    acl_name: String,
    #[serde(default)]
    direction: String,
    interface: WireInterfaceName,
}

#[derive(Debug, Clone, Deserialize)]
struct WireInterfaceName {
    name: String,
}

/// Inbound ACL bound to a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessGroup {
    pub acl: String,
    pub direction: String,
    pub zone: String,
}

/// A rule the dry-run submitter accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedRule {
    pub zone: String,
    pub payload: WireRule,
}

/// Appliance state loaded from a snapshot directory.
#[derive(Debug)]
pub struct ApplianceSnapshot {
    dir: PathBuf,
    routes: Vec<RawRoute>,
    objects: BTreeMap<String, WireValue>,
    groups: BTreeMap<String, Vec<GroupMember>>,
    service_groups: Option<BTreeSet<String>>,
    access_groups: Vec<AccessGroup>,
    acls: RefCell<BTreeMap<String, Vec<AclEntry>>>,
    submitted: RefCell<Vec<SubmittedRule>>,
    classifier: AddressClassifier,
}

impl ApplianceSnapshot {
    pub fn load(dir: &Path, classifier: AddressClassifier) -> Result<Self, SnapshotError> {
        let routes = read_items::<RawRoute>(&dir.join("routes.json"))?;

        let objects = read_optional_items::<WireNetworkObject>(&dir.join("networkobjects.json"))?
            .into_iter()
            .filter_map(|o| o.object_id.or(o.name).map(|id| (id, o.host)))
            .collect();
        let groups = read_optional_items::<WireObjectGroup>(&dir.join("networkobjectgroups.json"))?
            .into_iter()
            .filter_map(|g| g.object_id.or(g.name).map(|id| (id, g.members)))
            .collect();

        let service_groups_path = dir.join("networkservicegroups.json");
        let service_groups = if service_groups_path.exists() {
            Some(
                read_items::<WireObjectGroup>(&service_groups_path)?
                    .into_iter()
                    .filter_map(|g| g.object_id.or(g.name))
                    .collect(),
            )
        } else {
            None
        };

        let access_groups = read_optional_items::<WireAccessGroup>(&dir.join("access_groups.json"))?
            .into_iter()
            .map(|g| AccessGroup {
                acl: g.acl_name,
                direction: g.direction,
                zone: g.interface.name,
            })
            .collect();

        let acls = read_acls(&dir.join("acls"))?;
        info!(
            snapshot = %dir.display(),
            routes = routes.len(),
            zones_with_acl = acls.len(),
            "loaded appliance snapshot"
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            routes,
            objects,
            groups,
            service_groups,
            access_groups,
            acls: RefCell::new(acls),
            submitted: RefCell::new(Vec::new()),
            classifier,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn route_table(&self, management_zone: &str) -> Result<RouteTable, RouteParseError> {
        Ok(RouteTable::parse(&self.routes, &self.classifier)?.with_management_zone(management_zone))
    }

    pub fn access_groups(&self) -> &[AccessGroup] {
        &self.access_groups
    }

    /// ACL name bound inbound to `zone`, if the snapshot lists access groups.
    pub fn acl_name(&self, zone: &str) -> Option<&str> {
        self.access_groups
            .iter()
            .find(|g| g.zone == zone && !g.direction.eq_ignore_ascii_case("out"))
            .map(|g| g.acl.as_str())
    }

    pub fn acl_entries(&self, zone: &str) -> Option<Vec<AclEntry>> {
        self.acls.borrow().get(zone).cloned()
    }

    pub fn submitted(&self) -> Vec<SubmittedRule> {
        self.submitted.borrow().clone()
    }

    fn validate(&self, zone: &str, rule: &AclRule) -> Result<(), SubmitOutcome> {
        self.check_address("source", rule.source())?;
        self.check_address("destination", rule.destination())?;
        self.check_service(rule.service())?;

        let acls = self.acls.borrow();
        let entries = acls.get(zone).ok_or_else(|| {
            api_error(
                404,
                "Not Found",
                "RESOURCE-NOT-FOUND",
                &format!("no inbound access-list on interface {zone}"),
            )
        })?;
        // Accepting a rule shifts every later entry down one slot, so the
        // current last position must leave room for that.
        let last = entries.iter().map(|e| e.position).max().unwrap_or(0);
        let Some(max) = last.checked_add(1) else {
            return Err(api_error(
                400,
                "Bad Request",
                "INVALID-INPUT",
                &format!("access-list on interface {zone} has no position after {last}"),
            ));
        };
        if rule.position() > max {
            return Err(api_error(
                400,
                "Bad Request",
                "INVALID-INPUT",
                &format!("position {} is beyond the end of the access-list", rule.position()),
            ));
        }
        Ok(())
    }

    fn check_address(&self, field: &str, value: &RuleField<AddressKind>) -> Result<(), SubmitOutcome> {
        let literal = value.literal();
        let valid = match value.kind() {
            AddressKind::Any => true,
            AddressKind::Host => literal.parse::<IpAddr>().is_ok(),
            AddressKind::Network => literal.parse::<IpNetwork>().is_ok(),
            AddressKind::Range => literal
                .split_once('-')
                .is_some_and(|(a, b)| {
                    a.trim().parse::<IpAddr>().is_ok() && b.trim().parse::<IpAddr>().is_ok()
                }),
            AddressKind::GroupReference => {
                return self.require(self.groups.contains_key(literal), field, literal);
            }
            AddressKind::ObjectReference => {
                return self.require(self.objects.contains_key(literal), field, literal);
            }
        };
        if valid {
            return Ok(());
        }
        Err(api_error(
            400,
            "Bad Request",
            "INVALID-INPUT",
            &format!("{field} '{literal}' is not a valid {} value", value.kind()),
        ))
    }

    fn check_service(&self, value: &RuleField<ServiceKind>) -> Result<(), SubmitOutcome> {
        match (value.kind(), &self.service_groups) {
            (ServiceKind::GroupReference, Some(known)) => {
                self.require(known.contains(value.literal()), "service", value.literal())
            }
            _ => Ok(()),
        }
    }

    fn require(&self, present: bool, field: &str, object_id: &str) -> Result<(), SubmitOutcome> {
        if present {
            return Ok(());
        }
        Err(api_error(
            400,
            "Bad Request",
            "RESOURCE-NOT-FOUND",
            &format!("{field} object '{object_id}' does not exist"),
        ))
    }
}

impl ObjectLookup for ApplianceSnapshot {
    fn group_members(
        &self,
        _ctx: &SessionContext,
        group: &str,
    ) -> Result<Vec<GroupMember>, LookupError> {
        self.groups
            .get(group)
            .cloned()
            .ok_or_else(|| LookupError::NotFound {
                object_id: group.to_string(),
            })
    }

    fn object_address(&self, _ctx: &SessionContext, object_id: &str) -> Result<String, LookupError> {
        if let Some(host) = self.objects.get(object_id) {
            return host
                .value
                .clone()
                .ok_or_else(|| LookupError::Unusable {
                    object_id: object_id.to_string(),
                    reason: format!("object of kind '{}' has no value", host.kind),
                });
        }

        // Groups dereference one level, through their first member.
        let members = self
            .groups
            .get(object_id)
            .ok_or_else(|| LookupError::NotFound {
                object_id: object_id.to_string(),
            })?;
        match members.first() {
            Some(GroupMember::Literal(value)) => Ok(value.clone()),
            Some(GroupMember::Reference(inner)) => self
                .objects
                .get(inner)
                .and_then(|host| host.value.clone())
                .ok_or_else(|| LookupError::Unusable {
                    object_id: object_id.to_string(),
                    reason: format!("first member '{inner}' is not a network object"),
                }),
            None => Err(LookupError::Unusable {
                object_id: object_id.to_string(),
                reason: "group has no members".to_string(),
            }),
        }
    }
}

impl PositionSource for ApplianceSnapshot {
    fn last_position(&self, _ctx: &SessionContext, zone: &str) -> Result<u32, PositionError> {
        let acls = self.acls.borrow();
        let entries = acls.get(zone).ok_or_else(|| PositionError::ZoneNotFound {
            zone: zone.to_string(),
        })?;
        Ok(entries.iter().map(|e| e.position).max().unwrap_or(1))
    }
}

impl Submitter for ApplianceSnapshot {
    fn submit(&self, ctx: &SessionContext, zone: &str, rule: &AclRule) -> SubmitOutcome {
        if let Err(rejection) = self.validate(zone, rule) {
            debug!(zone, status = rejection.status_code, "dry-run submission rejected");
            return rejection;
        }

        let position = rule.position();
        if let Some(entries) = self.acls.borrow_mut().get_mut(zone) {
            for entry in entries.iter_mut().filter(|e| e.position >= position) {
                entry.position = entry.position.saturating_add(1);
            }
            entries.push(AclEntry::from(rule));
            entries.sort_by_key(|e| e.position);
        }
        self.submitted.borrow_mut().push(SubmittedRule {
            zone: zone.to_string(),
            payload: rule.to_wire(),
        });
        debug!(appliance = %ctx.appliance, zone, position, "dry-run submission accepted");
        SubmitOutcome::created()
    }
}

fn api_error(status_code: u16, reason: &str, code: &str, details: &str) -> SubmitOutcome {
    let body = json!({
        "messages": [{"level": "Error", "code": code, "details": details}]
    });
    SubmitOutcome::rejected(status_code, reason, body.to_string())
}

fn read_items<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, SnapshotError> {
    let raw = fs::read_to_string(path).map_err(|source| SnapshotError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let list: ItemList<T> = serde_json::from_str(&raw).map_err(|source| SnapshotError::Json {
        path: path.display().to_string(),
        source,
    })?;
    Ok(list.items)
}

fn read_optional_items<T: serde::de::DeserializeOwned>(
    path: &Path,
) -> Result<Vec<T>, SnapshotError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    read_items(path)
}

fn read_acls(dir: &Path) -> Result<BTreeMap<String, Vec<AclEntry>>, SnapshotError> {
    let mut out = BTreeMap::new();
    if !dir.is_dir() {
        return Ok(out);
    }
    let listing = fs::read_dir(dir).map_err(|source| SnapshotError::Io {
        path: dir.display().to_string(),
        source,
    })?;
    for entry in listing {
        let path = entry
            .map_err(|source| SnapshotError::Io {
                path: dir.display().to_string(),
                source,
            })?
            .path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(zone) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let mut entries: Vec<AclEntry> = read_items::<WireAce>(&path)?
            .iter()
            .map(AclEntry::from)
            .collect();
        entries.sort_by_key(|e| e.position);
        out.insert(zone.to_string(), entries);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use asa_policy_core::{
        AclRuleBuilder, AddressClassifier, AddressKind, FailureReason, GroupMember, LookupError,
        ObjectLookup, PositionError, PositionSource, ProvisioningPipeline, ProvisioningRequest,
        ServiceKind, SessionContext, Submitter,
    };
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::{AccessGroup, ApplianceSnapshot};

    fn write_snapshot(dir: &Path) {
        fs::write(
            dir.join("routes.json"),
            r#"{"items": [
                {"network": {"kind": "IPv4Network", "value": "192.168.6.0/24"},
                 "gateway": {"kind": "IPv4Address", "value": "192.168.1.9"},
                 "interface": {"name": "lab", "objectId": "GigabitEthernet0_API_SLASH_0"}}
            ]}"#,
        )
        .expect("routes");
        fs::write(
            dir.join("networkobjects.json"),
            r#"{"items": [{"objectId": "database0001", "host": {"kind": "IPv4Address", "value": "192.168.6.98"}}]}"#,
        )
        .expect("objects");
        fs::write(
            dir.join("networkobjectgroups.json"),
            r#"{"items": [
                {"objectId": "grp-databases", "members": [
                    {"kind": "objectRef#NetworkObj", "objectId": "database0001"},
                    {"kind": "IPv4Address", "value": "192.168.6.40"}]}
            ]}"#,
        )
        .expect("groups");
        fs::create_dir(dir.join("acls")).expect("acls dir");
        fs::write(
            dir.join("acls").join("lab.json"),
            r#"{"items": [
                {"position": 1, "permit": true,
                 "sourceAddress": {"kind": "IPv4Address", "value": "10.1.1.2"},
                 "destinationAddress": {"kind": "AnyIPAddress", "value": "any4"},
                 "destinationService": {"kind": "NetworkProtocol", "value": "ip"}},
                {"position": 2, "permit": false,
                 "sourceAddress": {"kind": "AnyIPAddress", "value": "any4"},
                 "destinationAddress": {"kind": "AnyIPAddress", "value": "any4"},
                 "destinationService": {"kind": "NetworkProtocol", "value": "ip"}}
            ]}"#,
        )
        .expect("acl");
    }

    #[test]
    fn lookups_dereference_objects_and_groups() {
        let dir = tempdir().expect("tempdir");
        write_snapshot(dir.path());
        let snap = ApplianceSnapshot::load(dir.path(), AddressClassifier::default()).expect("load");
        let ctx = SessionContext::new("lab-asa");

        assert_eq!(
            snap.group_members(&ctx, "grp-databases").expect("members")[0],
            GroupMember::Reference("database0001".to_string())
        );
        assert_eq!(snap.object_address(&ctx, "database0001").expect("addr"), "192.168.6.98");
        assert_eq!(snap.object_address(&ctx, "grp-databases").expect("addr"), "192.168.6.98");
        assert_eq!(
            snap.object_address(&ctx, "ghost"),
            Err(LookupError::NotFound {
                object_id: "ghost".to_string()
            })
        );
    }

    #[test]
    fn accepted_rules_shift_last_position() {
        let dir = tempdir().expect("tempdir");
        write_snapshot(dir.path());
        let snap = ApplianceSnapshot::load(dir.path(), AddressClassifier::default()).expect("load");
        let ctx = SessionContext::new("lab-asa");

        assert_eq!(snap.last_position(&ctx, "lab"), Ok(2));
        assert_eq!(
            snap.last_position(&ctx, "weblab"),
            Err(PositionError::ZoneNotFound {
                zone: "weblab".to_string()
            })
        );

        let rule = AclRuleBuilder::new().build(
            AddressKind::GroupReference,
            "grp-databases",
            AddressKind::Host,
            "10.2.2.2",
            ServiceKind::TcpUdp,
            "tcp/443",
            "RITM1",
            2,
        );
        assert!(snap.submit(&ctx, "lab", &rule).ok);
        assert_eq!(snap.last_position(&ctx, "lab"), Ok(3));

        let entries = snap.acl_entries("lab").expect("entries");
        let order: Vec<(u32, &str)> = entries
            .iter()
            .map(|e| (e.position, e.source.as_str()))
            .collect();
        assert_eq!(order, vec![(1, "10.1.1.2"), (2, "grp-databases"), (3, "any")]);
        assert_eq!(snap.submitted().len(), 1);
    }

    #[test]
    fn rejects_unknown_references_and_malformed_prefixes() {
        let dir = tempdir().expect("tempdir");
        write_snapshot(dir.path());
        let snap = ApplianceSnapshot::load(dir.path(), AddressClassifier::default()).expect("load");
        let ctx = SessionContext::new("lab-asa");
        let builder = AclRuleBuilder::new();

        let unknown = builder.build(
            AddressKind::GroupReference,
            "grp-ghost",
            AddressKind::Any,
            "any4",
            ServiceKind::Protocol,
            "ip",
            "",
            1,
        );
        let outcome = snap.submit(&ctx, "lab", &unknown);
        assert!(!outcome.ok);
        assert_eq!(outcome.status_code, 400);
        assert!(outcome.content.contains("RESOURCE-NOT-FOUND"));

        let malformed = builder.build(
            AddressKind::Network,
            "10.0.0.0/33",
            AddressKind::Any,
            "any4",
            ServiceKind::Protocol,
            "ip",
            "",
            1,
        );
        let outcome = snap.submit(&ctx, "lab", &malformed);
        assert_eq!(outcome.status_code, 400);
        assert!(outcome.content.contains("INVALID-INPUT"));
        assert!(snap.submitted().is_empty());
    }

    #[test]
    fn spaced_range_is_accepted() {
        let dir = tempdir().expect("tempdir");
        write_snapshot(dir.path());
        let snap = ApplianceSnapshot::load(dir.path(), AddressClassifier::default()).expect("load");
        let ctx = SessionContext::new("lab-asa");

        let rule = AclRuleBuilder::new().build(
            AddressKind::Range,
            "192.168.6.10 - 192.168.6.20",
            AddressKind::Any,
            "any4",
            ServiceKind::Protocol,
            "ip",
            "",
            2,
        );
        assert!(snap.submit(&ctx, "lab", &rule).ok);
    }

    #[test]
    fn acl_at_maximum_position_fails_only_its_row() {
        let dir = tempdir().expect("tempdir");
        write_snapshot(dir.path());
        fs::write(
            dir.path().join("routes.json"),
            r#"{"items": [
                {"network": {"kind": "IPv4Network", "value": "192.168.6.0/24"},
                 "gateway": {"kind": "IPv4Address", "value": "192.168.1.9"},
                 "interface": {"name": "lab", "objectId": "GigabitEthernet0_API_SLASH_1"}},
                {"network": {"kind": "IPv4Network", "value": "192.168.12.0/24"},
                 "gateway": {"kind": "IPv4Address", "value": "192.168.1.10"},
                 "interface": {"name": "weblab", "objectId": "GigabitEthernet0_API_SLASH_2"}}
            ]}"#,
        )
        .expect("routes");
        fs::write(
            dir.path().join("acls").join("lab.json"),
            r#"{"items": [
                {"position": 4294967295, "permit": false,
                 "sourceAddress": {"kind": "AnyIPAddress", "value": "any4"},
                 "destinationAddress": {"kind": "AnyIPAddress", "value": "any4"},
                 "destinationService": {"kind": "NetworkProtocol", "value": "ip"}}
            ]}"#,
        )
        .expect("lab acl");
        fs::write(dir.path().join("acls").join("weblab.json"), r#"{"items": []}"#)
            .expect("weblab acl");

        let snap = ApplianceSnapshot::load(dir.path(), AddressClassifier::default()).expect("load");
        let table = snap.route_table("management").expect("routes");
        let ctx = SessionContext::new("lab-asa");
        let request = |source: &str| ProvisioningRequest {
            source: source.to_string(),
            destination: "any4".to_string(),
            service: "ip".to_string(),
            remark: String::new(),
        };

        let outcomes = ProvisioningPipeline::new(&ctx, &table, &snap, &snap, &snap)
            .run(&[request("192.168.6.5"), request("192.168.12.5")]);

        assert_eq!(outcomes.len(), 2);
        match outcomes[0].failure() {
            Some(FailureReason::RemoteRejection {
                status_code,
                content,
                ..
            }) => {
                assert_eq!(*status_code, 400);
                assert!(content.contains("INVALID-INPUT"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(outcomes[1].is_success());
        assert_eq!(snap.acl_entries("lab").expect("lab").len(), 1);
        assert_eq!(snap.acl_entries("weblab").expect("weblab")[0].position, 1);
    }

    #[test]
    fn access_groups_map_acl_names_to_zones() {
        let dir = tempdir().expect("tempdir");
        write_snapshot(dir.path());
        fs::write(
            dir.path().join("access_groups.json"),
            r#"{"items": [
                {"ACLName": "lab_access_in", "direction": "IN", "interface": {"name": "lab"}},
                {"ACLName": "lab_access_out", "direction": "OUT", "interface": {"name": "lab"}}
            ]}"#,
        )
        .expect("access groups");
        let snap = ApplianceSnapshot::load(dir.path(), AddressClassifier::default()).expect("load");

        assert_eq!(
            snap.access_groups()[1],
            AccessGroup {
                acl: "lab_access_out".to_string(),
                direction: "OUT".to_string(),
                zone: "lab".to_string(),
            }
        );
        assert_eq!(snap.acl_name("lab"), Some("lab_access_in"));
        assert_eq!(snap.acl_name("weblab"), None);
    }
}
