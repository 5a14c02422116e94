//! Naming convention for generated network objects.
//!
//! Objects are named after the zone that routes them and their value:
//! `<zone>-host-<ip>_32`, `<zone>-network-<addr>_<len>`,
//! `<zone>-range-<start>_<end>`.

use serde::Serialize;

use crate::classify::{AddressKind, FieldKind};
use crate::route::{ResolveError, RouteTable};
use crate::wire::WireValue;

/// Generated object name, or `None` for kinds that are not created as objects.
pub fn object_name(kind: AddressKind, zone: &str, literal: &str) -> Option<String> {
    let literal = literal.trim();
    match kind {
        AddressKind::Host => {
            let prefix = if literal.contains(':') { 128 } else { 32 };
            Some(format!("{zone}-host-{literal}_{prefix}"))
        }
        AddressKind::Network => {
            let (addr, len) = literal.split_once('/')?;
            Some(format!("{zone}-network-{}_{}", addr.trim(), len.trim()))
        }
        AddressKind::Range => {
            let (start, end) = literal.split_once('-')?;
            Some(format!("{zone}-range-{}_{}", start.trim(), end.trim()))
        }
        AddressKind::Any | AddressKind::GroupReference | AddressKind::ObjectReference => None,
    }
}

/// Payload for `POST objects/networkobjects`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkObjectDraft {
    pub name: String,
    pub host: WireValue,
    pub description: String,
    pub kind: String,
    /// Zone the object was named after; not part of the payload.
    #[serde(skip)]
    pub zone: String,
}

impl NetworkObjectDraft {
    /// Resolve the literal's zone and name a new object after it.
    ///
    /// A `/32` (or `/128`) suffix is dropped so single addresses become host objects.
    pub fn for_literal(
        literal: &str,
        description: &str,
        table: &RouteTable,
    ) -> Result<Self, ResolveError> {
        let literal = strip_host_prefix(literal.trim());
        let kind = table.classifier().classify(literal);
        let route = table.resolve_zone(literal)?;
        let name = object_name(kind, route.zone(), literal).ok_or_else(|| {
            ResolveError::Unroutable {
                literal: literal.to_string(),
                kind,
            }
        })?;

        Ok(Self {
            name,
            host: WireValue::by_value(kind.wire_kind(literal), literal),
            description: description.to_string(),
            kind: "object#NetworkObj".to_string(),
            zone: route.zone().to_string(),
        })
    }
}

fn strip_host_prefix(literal: &str) -> &str {
    literal
        .strip_suffix("/32")
        .filter(|addr| !addr.contains(':'))
        .or_else(|| literal.strip_suffix("/128").filter(|addr| addr.contains(':')))
        .unwrap_or(literal)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{object_name, NetworkObjectDraft};
    use crate::classify::AddressKind;
    use crate::route::{HardwareId, RouteEntry, RouteTable};

    #[test]
    fn names_follow_zone_kind_value_convention() {
        assert_eq!(
            object_name(AddressKind::Host, "lab", "192.168.6.98").as_deref(),
            Some("lab-host-192.168.6.98_32")
        );
        assert_eq!(
            object_name(AddressKind::Network, "weblab", "192.168.12.0/24").as_deref(),
            Some("weblab-network-192.168.12.0_24")
        );
        assert_eq!(
            object_name(AddressKind::Range, "lab", "10.0.0.1-10.0.0.9").as_deref(),
            Some("lab-range-10.0.0.1_10.0.0.9")
        );
        assert_eq!(object_name(AddressKind::GroupReference, "lab", "grp-x"), None);
    }

    #[test]
    fn draft_strips_host_prefix_and_resolves_zone() {
        let table = RouteTable::from_entries(vec![RouteEntry::new(
            "192.168.6.0/24".parse().expect("cidr"),
            "192.168.1.9".parse().expect("ip"),
            "lab",
            HardwareId::from_object_id("GigabitEthernet0_API_SLASH_0"),
        )]);
        let draft =
            NetworkObjectDraft::for_literal("192.168.6.98/32", "LABDBWD0002", &table).expect("draft");
        assert_eq!(draft.name, "lab-host-192.168.6.98_32");
        assert_eq!(draft.host.kind, "IPv4Address");
        assert_eq!(draft.host.value.as_deref(), Some("192.168.6.98"));
        assert_eq!(draft.zone, "lab");
    }
}
