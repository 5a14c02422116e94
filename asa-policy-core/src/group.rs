//! Zone ownership of network object groups.
//!
//! A group is assigned the zone of its **first** member. Groups are
//! conventionally built from addresses behind the same gateway, so one member
//! stands for the whole group; nothing here enforces that. Callers that want
//! to know when the assumption breaks can run [`check_group_homogeneity`],
//! which reports members resolving elsewhere as [`ZoneMismatch`] warnings.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::capability::{LookupError, ObjectLookup, SessionContext};
use crate::route::{ResolveError, RouteEntry, RouteTable};
use crate::wire::WireValue;

/// One entry of an object group's member list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireValue")]
pub enum GroupMember {
    /// Inline host, network or range literal.
    Literal(String),
    /// Named object (or nested group) that must be dereferenced.
    Reference(String),
}

impl GroupMember {
    pub fn as_str(&self) -> &str {
        match self {
            GroupMember::Literal(value) | GroupMember::Reference(value) => value,
        }
    }
}

impl TryFrom<WireValue> for GroupMember {
    type Error = String;

    fn try_from(wire: WireValue) -> Result<Self, Self::Error> {
        if wire.is_reference() {
            wire.object_id
                .map(GroupMember::Reference)
                .ok_or_else(|| format!("member of kind '{}' has no objectId", wire.kind))
        } else {
            wire.value
                .map(GroupMember::Literal)
                .ok_or_else(|| format!("member of kind '{}' has no value", wire.kind))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZoneResolutionError {
    #[error("object group '{group}' has no members")]
    EmptyGroup { group: String },
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Route(#[from] ResolveError),
}

/// Zone assignment of a group, with the member and route it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupZone {
    pub group: String,
    pub zone: String,
    /// Address literal of the member that was resolved.
    pub address: String,
    pub route: RouteEntry,
}

/// A group member whose zone differs from the group's assigned zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneMismatch {
    pub group: String,
    pub member: String,
    pub expected: String,
    /// `None` when the member could not be resolved at all.
    pub found: Option<String>,
}

/// Resolve the zone of an object group through its first member.
pub fn resolve_group_zone(
    ctx: &SessionContext,
    group: &str,
    members: &[GroupMember],
    table: &RouteTable,
    lookup: &dyn ObjectLookup,
) -> Result<GroupZone, ZoneResolutionError> {
    let first = members
        .first()
        .ok_or_else(|| ZoneResolutionError::EmptyGroup {
            group: group.to_string(),
        })?;
    let address = member_address(ctx, first, lookup)?;
    let route = table.resolve_zone(&address)?;
    debug!(group, member = first.as_str(), zone = route.zone(), "resolved group zone");

    Ok(GroupZone {
        group: group.to_string(),
        zone: route.zone().to_string(),
        address,
        route: route.clone(),
    })
}

/// Report every member that does not resolve to the first member's zone.
///
/// Returns an empty list when the first member itself cannot be resolved;
/// [`resolve_group_zone`] surfaces that failure.
pub fn check_group_homogeneity(
    ctx: &SessionContext,
    group: &str,
    members: &[GroupMember],
    table: &RouteTable,
    lookup: &dyn ObjectLookup,
) -> Vec<ZoneMismatch> {
    let Ok(assigned) = resolve_group_zone(ctx, group, members, table, lookup) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for member in members.iter().skip(1) {
        let found = member_address(ctx, member, lookup)
            .ok()
            .and_then(|address| table.resolve_zone(&address).ok())
            .map(|route| route.zone().to_string());
        if found.as_deref() == Some(assigned.zone.as_str()) {
            continue;
        }
        warn!(
            group,
            member = member.as_str(),
            expected = %assigned.zone,
            found = found.as_deref().unwrap_or("<unresolved>"),
            "object group spans more than one zone"
        );
        out.push(ZoneMismatch {
            group: group.to_string(),
            member: member.as_str().to_string(),
            expected: assigned.zone.clone(),
            found,
        });
    }
    out
}

fn member_address(
    ctx: &SessionContext,
    member: &GroupMember,
    lookup: &dyn ObjectLookup,
) -> Result<String, LookupError> {
    match member {
        GroupMember::Literal(value) => Ok(value.clone()),
        GroupMember::Reference(object_id) => lookup.object_address(ctx, object_id),
    }
}
