//! Literal classification for addresses and services.
//!
//! The management API represents every source, destination and service with a
//! `kind` tag, and the tag decides which payload key carries the literal:
//! object and object-group references go in `objectId`, everything else in
//! `value`. Classification works on surface syntax only because no round-trip
//! to the appliance is available at this layer.
//!
//! ## Address precedence
//!
//! 1. reserved match-any token (`any4`, `any6`, `any`) → [`AddressKind::Any`]
//! 2. contains `/` → [`AddressKind::Network`] (prefix length is not validated)
//! 3. two address-shaped halves joined by one `-` → [`AddressKind::Range`]
//! 4. group naming pattern → [`AddressKind::GroupReference`]
//! 5. object naming pattern → [`AddressKind::ObjectReference`]
//! 6. anything else → [`AddressKind::Host`]

use std::fmt;

use regex::Regex;
use serde::Serialize;

/// Tokens the appliance accepts as "match any address".
pub const DEFAULT_ANY_TOKENS: &[&str] = &["any4", "any6", "any"];
/// Tokens accepted as "match any service".
pub const DEFAULT_SERVICE_ANY_TOKENS: &[&str] = &["any"];
/// Object groups follow the `grp-<purpose>` naming convention.
pub const DEFAULT_GROUP_PATTERN: &str = "^grp-";
/// Network objects are either `obj-<name>` or generated `<zone>-<kind>-<value>` names.
pub const DEFAULT_OBJECT_PATTERN: &str = "^obj-|-(host|network|range)-";

/// Which payload key a classified literal must be written under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FieldKey {
    /// Literal goes in `value`.
    ByValue,
    /// Literal is a named object and goes in `objectId`.
    ByReference,
}

impl FieldKey {
    /// JSON key used by the management API for this slot.
    pub fn wire_key(self) -> &'static str {
        match self {
            FieldKey::ByValue => "value",
            FieldKey::ByReference => "objectId",
        }
    }
}

/// Common behavior of address and service kinds.
pub trait FieldKind: Copy + fmt::Debug {
    /// Payload slot this kind populates.
    fn field_key(self) -> FieldKey;

    /// Management API `kind` tag for a literal of this kind.
    ///
    /// The literal is needed to pick between IPv4 and IPv6 variants.
    fn wire_kind(self, literal: &str) -> &'static str;
}

/// Return the payload slot for `kind`.
///
/// References (`GroupReference`, `ObjectReference`) map to
/// [`FieldKey::ByReference`], all other kinds to [`FieldKey::ByValue`].
pub fn field_key_for<K: FieldKind>(kind: K) -> FieldKey {
    kind.field_key()
}

/// Semantic kind of an address literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AddressKind {
    Any,
    Host,
    Network,
    Range,
    GroupReference,
    ObjectReference,
}

impl AddressKind {
    pub fn is_reference(self) -> bool {
        matches!(
            self,
            AddressKind::GroupReference | AddressKind::ObjectReference
        )
    }

    /// Map a management API `kind` tag back to an address kind.
    pub fn from_wire(kind: &str) -> Option<Self> {
        match kind {
            "AnyIPAddress" => Some(AddressKind::Any),
            "IPv4Address" | "IPv6Address" => Some(AddressKind::Host),
            "IPv4Network" | "IPv6Network" => Some(AddressKind::Network),
            "IPv4Range" | "IPv6Range" => Some(AddressKind::Range),
            "objectRef#NetworkObjGroup" => Some(AddressKind::GroupReference),
            "objectRef#NetworkObj" => Some(AddressKind::ObjectReference),
            _ => None,
        }
    }
}

impl FieldKind for AddressKind {
    fn field_key(self) -> FieldKey {
        if self.is_reference() {
            FieldKey::ByReference
        } else {
            FieldKey::ByValue
        }
    }

    fn wire_kind(self, literal: &str) -> &'static str {
        let v6 = literal.contains(':');
        match self {
            AddressKind::Any => "AnyIPAddress",
            AddressKind::Host if v6 => "IPv6Address",
            AddressKind::Host => "IPv4Address",
            AddressKind::Network if v6 => "IPv6Network",
            AddressKind::Network => "IPv4Network",
            AddressKind::Range if v6 => "IPv6Range",
            AddressKind::Range => "IPv4Range",
            AddressKind::GroupReference => "objectRef#NetworkObjGroup",
            AddressKind::ObjectReference => "objectRef#NetworkObj",
        }
    }
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AddressKind::Any => "any",
            AddressKind::Host => "host",
            AddressKind::Network => "network",
            AddressKind::Range => "range",
            AddressKind::GroupReference => "group",
            AddressKind::ObjectReference => "object",
        };
        f.write_str(name)
    }
}

/// Semantic kind of a destination service literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ServiceKind {
    Any,
    /// Bare protocol such as `ip`, `tcp`, `esp`.
    Protocol,
    /// `tcp/<port>`, `udp/<port>` or `tcp-udp/<port>`.
    TcpUdp,
    /// `icmp`, `icmp/<type>`, `icmp6`, `icmp6/<type>`.
    Icmp,
    GroupReference,
    ObjectReference,
}

impl ServiceKind {
    pub fn is_reference(self) -> bool {
        matches!(
            self,
            ServiceKind::GroupReference | ServiceKind::ObjectReference
        )
    }

    /// Map a management API service `kind` tag back to a service kind.
    pub fn from_wire(kind: &str) -> Option<Self> {
        match kind {
            "AnyService" => Some(ServiceKind::Any),
            "NetworkProtocol" => Some(ServiceKind::Protocol),
            "TcpUdpService" => Some(ServiceKind::TcpUdp),
            "ICMPService" | "ICMP6Service" => Some(ServiceKind::Icmp),
            "objectRef#NetworkServiceGroup" | "objectRef#NetworkServiceGroups" => {
                Some(ServiceKind::GroupReference)
            }
            "objectRef#NetworkServiceObj" | "objectRef#NetworkServiceObjects" => {
                Some(ServiceKind::ObjectReference)
            }
            _ => None,
        }
    }
}

impl FieldKind for ServiceKind {
    fn field_key(self) -> FieldKey {
        if self.is_reference() {
            FieldKey::ByReference
        } else {
            FieldKey::ByValue
        }
    }

    fn wire_kind(self, literal: &str) -> &'static str {
        match self {
            ServiceKind::Any => "AnyService",
            ServiceKind::Protocol => "NetworkProtocol",
            ServiceKind::TcpUdp => "TcpUdpService",
            ServiceKind::Icmp if literal.trim().to_ascii_lowercase().starts_with("icmp6") => {
                "ICMP6Service"
            }
            ServiceKind::Icmp => "ICMPService",
            ServiceKind::GroupReference => "objectRef#NetworkServiceGroup",
            ServiceKind::ObjectReference => "objectRef#NetworkServiceObj",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceKind::Any => "any",
            ServiceKind::Protocol => "protocol",
            ServiceKind::TcpUdp => "tcp-udp",
            ServiceKind::Icmp => "icmp",
            ServiceKind::GroupReference => "group",
            ServiceKind::ObjectReference => "object",
        };
        f.write_str(name)
    }
}

/// Classifies address and service literals by their surface syntax.
///
/// The classifier is pure: the same literal always yields the same kind.
#[derive(Debug, Clone)]
pub struct AddressClassifier {
    any_tokens: Vec<String>,
    service_any_tokens: Vec<String>,
    group_pattern: Regex,
    object_pattern: Regex,
}

impl AddressClassifier {
    /// Build a classifier from custom tokens and naming patterns.
    pub fn new<S: AsRef<str>>(
        any_tokens: &[S],
        service_any_tokens: &[S],
        group_pattern: &str,
        object_pattern: &str,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            any_tokens: normalize_tokens(any_tokens),
            service_any_tokens: normalize_tokens(service_any_tokens),
            group_pattern: Regex::new(group_pattern)?,
            object_pattern: Regex::new(object_pattern)?,
        })
    }

    pub fn is_any_token(&self, literal: &str) -> bool {
        let literal = literal.trim();
        self.any_tokens
            .iter()
            .any(|token| token.eq_ignore_ascii_case(literal))
    }

    /// Classify an address literal. Total: every input maps to exactly one kind.
    pub fn classify(&self, literal: &str) -> AddressKind {
        let literal = literal.trim();
        if self.is_any_token(literal) {
            AddressKind::Any
        } else if literal.contains('/') {
            AddressKind::Network
        } else if is_range_shaped(literal) {
            AddressKind::Range
        } else if self.group_pattern.is_match(literal) {
            AddressKind::GroupReference
        } else if self.object_pattern.is_match(literal) {
            AddressKind::ObjectReference
        } else {
            AddressKind::Host
        }
    }

    /// Classify a destination service literal.
    pub fn classify_service(&self, literal: &str) -> ServiceKind {
        let literal = literal.trim();
        let lower = literal.to_ascii_lowercase();
        if self
            .service_any_tokens
            .iter()
            .any(|token| token.eq_ignore_ascii_case(literal))
        {
            ServiceKind::Any
        } else if ["tcp/", "udp/", "tcp-udp/"]
            .iter()
            .any(|prefix| lower.starts_with(prefix))
        {
            ServiceKind::TcpUdp
        } else if lower == "icmp"
            || lower == "icmp6"
            || lower.starts_with("icmp/")
            || lower.starts_with("icmp6/")
        {
            ServiceKind::Icmp
        } else if self.group_pattern.is_match(literal) {
            ServiceKind::GroupReference
        } else if self.object_pattern.is_match(literal) {
            ServiceKind::ObjectReference
        } else {
            ServiceKind::Protocol
        }
    }
}

impl Default for AddressClassifier {
    fn default() -> Self {
        Self::new(
            DEFAULT_ANY_TOKENS,
            DEFAULT_SERVICE_ANY_TOKENS,
            DEFAULT_GROUP_PATTERN,
            DEFAULT_OBJECT_PATTERN,
        )
        .expect("built-in naming patterns compile")
    }
}

fn normalize_tokens<S: AsRef<str>>(tokens: &[S]) -> Vec<String> {
    tokens
        .iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Exactly one `-` with an address-looking token on each side. Whitespace
/// around the `-` is allowed.
///
/// Structural only; `10.0.0.300-10.0.0.1` is still a range here and is left
/// for the appliance to reject.
fn is_range_shaped(literal: &str) -> bool {
    let mut parts = literal.split('-');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(start), Some(end), None) => {
            is_address_shaped(start.trim()) && is_address_shaped(end.trim())
        }
        _ => false,
    }
}

fn is_address_shaped(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_hexdigit() || c == '.' || c == ':')
        && token.chars().any(|c| c == '.' || c == ':')
}
