//! Static route table and longest-prefix-match zone resolution.
//!
//! Routes come from the appliance's static routing endpoint. Each record names
//! the destination network, the next-hop gateway and the interface (zone) the
//! traffic leaves through. Resolving an address to a zone answers "which
//! interface's inbound ACL governs traffic sourced from this address".
//!
//! ## Resolution rules
//!
//! 1. Routes in the management zone are never eligible.
//! 2. Among routes whose destination contains the address, the longest prefix wins.
//! 3. The match-any route (`0.0.0.0/0`) is only chosen when nothing more specific matches.
//! 4. Equal prefix lengths resolve to the route listed first in the table.
//!    [`RouteTable::sorted_by_specificity`] gives a deterministic order for
//!    callers that do not want to depend on snapshot order.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::classify::{AddressClassifier, AddressKind};
use crate::wire::WireValue;

/// Zone used for out-of-band administration; never a policy destination.
pub const DEFAULT_MANAGEMENT_ZONE: &str = "management";

/// Token the API substitutes for `/` inside interface object ids.
const API_SLASH: &str = "_API_SLASH_";

/// One static route record as returned by the routing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRoute {
    pub network: WireValue,
    pub gateway: WireValue,
    pub interface: RawInterfaceRef,
}

/// Interface reference embedded in a route record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInterfaceRef {
    pub name: String,
    #[serde(default)]
    pub object_id: String,
}

/// Physical interface identity split into its type and number.
///
/// `GigabitEthernet0_API_SLASH_1` becomes `{kind: "GigabitEthernet0", number: "1"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct HardwareId {
    pub kind: String,
    pub number: String,
}

impl HardwareId {
    /// Split an interface object id into type and number.
    ///
    /// Ids without the API slash token fall back to splitting off trailing
    /// digits (`Port-channel12` → `Port-channel` / `12`); ids with neither keep
    /// the whole id as the type and an empty number.
    pub fn from_object_id(object_id: &str) -> Self {
        let object_id = object_id.trim();
        if let Some((kind, number)) = object_id.split_once(API_SLASH) {
            return Self {
                kind: kind.to_string(),
                number: number.replace(API_SLASH, "/"),
            };
        }

        let kind_len = object_id
            .trim_end_matches(|c: char| c.is_ascii_digit())
            .len();
        let (kind, number) = object_id.split_at(kind_len);
        if kind.is_empty() || number.is_empty() {
            return Self {
                kind: object_id.to_string(),
                number: String::new(),
            };
        }
        Self {
            kind: kind.to_string(),
            number: number.to_string(),
        }
    }
}

impl fmt::Display for HardwareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.number.is_empty() {
            f.write_str(&self.kind)
        } else {
            write!(f, "{}/{}", self.kind, self.number)
        }
    }
}

/// A normalized static route. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteEntry {
    destination: IpNetwork,
    gateway: IpAddr,
    zone: String,
    hardware: HardwareId,
}

impl RouteEntry {
    pub fn new(
        destination: IpNetwork,
        gateway: IpAddr,
        zone: impl Into<String>,
        hardware: HardwareId,
    ) -> Self {
        Self {
            destination,
            gateway,
            zone: zone.into(),
            hardware,
        }
    }

    pub fn destination(&self) -> IpNetwork {
        self.destination
    }

    pub fn gateway(&self) -> IpAddr {
        self.gateway
    }

    pub fn zone(&self) -> &str {
        &self.zone
    }

    pub fn hardware(&self) -> &HardwareId {
        &self.hardware
    }

    pub fn prefix_len(&self) -> u8 {
        self.destination.prefix()
    }

    pub fn contains(&self, address: IpAddr) -> bool {
        self.destination.contains(address)
    }
}

/// Errors raised while normalizing raw route records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteParseError {
    #[error("route #{index} has invalid destination '{value}': {reason}")]
    InvalidDestination {
        index: usize,
        value: String,
        reason: String,
    },
    #[error("route #{index} has invalid gateway '{value}'")]
    InvalidGateway { index: usize, value: String },
    #[error("route #{index} has no interface name")]
    MissingZone { index: usize },
}

/// Why an address could not be mapped to a zone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("no route covers {address}")]
    NoRouteFound { address: String },
    #[error("'{literal}' is not a valid address")]
    InvalidAddress { literal: String },
    #[error("'{literal}' is a {kind} literal and cannot be routed directly")]
    Unroutable { literal: String, kind: AddressKind },
}

/// Ordered collection of routes with longest-prefix-match lookup.
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
    management_zone: String,
    classifier: AddressClassifier,
}

impl RouteTable {
    /// Parse raw route records in table order.
    pub fn parse(
        raw_routes: &[RawRoute],
        classifier: &AddressClassifier,
    ) -> Result<Self, RouteParseError> {
        let entries = raw_routes
            .iter()
            .enumerate()
            .map(|(index, raw)| parse_route(index, raw, classifier))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(routes = entries.len(), "parsed static route table");

        Ok(Self {
            entries,
            management_zone: DEFAULT_MANAGEMENT_ZONE.to_string(),
            classifier: classifier.clone(),
        })
    }

    /// Build a table from already-normalized entries using the default classifier.
    pub fn from_entries(entries: Vec<RouteEntry>) -> Self {
        Self {
            entries,
            management_zone: DEFAULT_MANAGEMENT_ZONE.to_string(),
            classifier: AddressClassifier::default(),
        }
    }

    pub fn with_management_zone(mut self, zone: impl Into<String>) -> Self {
        self.management_zone = zone.into();
        self
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn management_zone(&self) -> &str {
        &self.management_zone
    }

    pub fn classifier(&self) -> &AddressClassifier {
        &self.classifier
    }

    pub fn is_management(&self, entry: &RouteEntry) -> bool {
        entry.zone.eq_ignore_ascii_case(&self.management_zone)
    }

    /// Copy of the table ordered most specific first; ties keep table order.
    pub fn sorted_by_specificity(&self) -> Self {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| b.prefix_len().cmp(&a.prefix_len()));
        Self {
            entries,
            management_zone: self.management_zone.clone(),
            classifier: self.classifier.clone(),
        }
    }

    /// Reduce a literal to the single address used for route lookup.
    ///
    /// Hosts resolve as themselves, networks by their network address and
    /// ranges by their first address.
    pub fn target_address(&self, literal: &str) -> Result<IpAddr, ResolveError> {
        let literal = literal.trim();
        let invalid = || ResolveError::InvalidAddress {
            literal: literal.to_string(),
        };
        match self.classifier.classify(literal) {
            AddressKind::Host => literal.parse::<IpAddr>().map_err(|_| invalid()),
            AddressKind::Network => literal
                .parse::<IpNetwork>()
                .map(|net| net.network())
                .map_err(|_| invalid()),
            AddressKind::Range => literal
                .split('-')
                .next()
                .and_then(|start| start.trim().parse::<IpAddr>().ok())
                .ok_or_else(invalid),
            kind => Err(ResolveError::Unroutable {
                literal: literal.to_string(),
                kind,
            }),
        }
    }

    /// Resolve an address literal to the route (and so the zone) that owns it.
    pub fn resolve_zone(&self, literal: &str) -> Result<&RouteEntry, ResolveError> {
        let address = self.target_address(literal)?;
        let entry = self
            .resolve_ip(address)
            .ok_or_else(|| ResolveError::NoRouteFound {
                address: literal.trim().to_string(),
            })?;
        debug!(
            address = %address,
            zone = entry.zone(),
            destination = %entry.destination(),
            "resolved zone"
        );
        Ok(entry)
    }

    /// Longest-prefix match over non-management routes; first entry wins ties.
    pub fn resolve_ip(&self, address: IpAddr) -> Option<&RouteEntry> {
        let mut best: Option<&RouteEntry> = None;
        for entry in self.entries.iter().filter(|e| !self.is_management(e)) {
            if !entry.contains(address) {
                continue;
            }
            match best {
                Some(current) if current.prefix_len() >= entry.prefix_len() => {}
                _ => best = Some(entry),
            }
        }
        best
    }
}

fn parse_route(
    index: usize,
    raw: &RawRoute,
    classifier: &AddressClassifier,
) -> Result<RouteEntry, RouteParseError> {
    let zone = raw.interface.name.trim();
    if zone.is_empty() {
        return Err(RouteParseError::MissingZone { index });
    }

    let destination = normalize_destination(index, &raw.network, classifier)?;
    let gateway_value = raw.gateway.value.as_deref().unwrap_or_default().trim();
    let gateway = gateway_value
        .parse::<IpAddr>()
        .map_err(|_| RouteParseError::InvalidGateway {
            index,
            value: gateway_value.to_string(),
        })?;

    Ok(RouteEntry {
        destination,
        gateway,
        zone: zone.to_string(),
        hardware: HardwareId::from_object_id(&raw.interface.object_id),
    })
}

fn normalize_destination(
    index: usize,
    network: &WireValue,
    classifier: &AddressClassifier,
) -> Result<IpNetwork, RouteParseError> {
    let value = network.value.as_deref().unwrap_or_default().trim();
    let invalid = |reason: String| RouteParseError::InvalidDestination {
        index,
        value: value.to_string(),
        reason,
    };

    if network.kind == "AnyIPAddress" || classifier.is_any_token(value) {
        let any = if value.eq_ignore_ascii_case("any6") {
            Ipv6Network::new(Ipv6Addr::UNSPECIFIED, 0).map(IpNetwork::V6)
        } else {
            Ipv4Network::new(Ipv4Addr::UNSPECIFIED, 0).map(IpNetwork::V4)
        };
        return any.map_err(|err| invalid(err.to_string()));
    }

    match classifier.classify(value) {
        AddressKind::Network => value
            .parse::<IpNetwork>()
            .map_err(|err| invalid(err.to_string())),
        AddressKind::Host => {
            let ip = value
                .parse::<IpAddr>()
                .map_err(|err| invalid(err.to_string()))?;
            let prefix = if ip.is_ipv4() { 32 } else { 128 };
            IpNetwork::new(ip, prefix).map_err(|err| invalid(err.to_string()))
        }
        kind => Err(invalid(format!("{kind} literals are not route destinations"))),
    }
}
