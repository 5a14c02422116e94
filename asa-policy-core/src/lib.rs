//! Zone resolution and ACL provisioning engine for REST-managed firewalls.
//!
//! The engine decides *where* a policy rule belongs and *how* it is encoded;
//! talking to the appliance is left to the [`capability`] traits.
//!
//! - [`classify`]: literal to address/service kind, and which payload key it uses
//! - [`route`]: static route table with longest-prefix-match zone resolution
//! - [`group`]: zone of an object group through its first member
//! - [`rule`]: typed ACL rules and their wire encoding
//! - [`pipeline`]: batch provisioning with per-row outcomes
//! - [`naming`]: generated network object names
//!
//! ```
//! use asa_policy_core::route::{HardwareId, RouteEntry, RouteTable};
//!
//! let route = |dest: &str, zone: &str| {
//!     RouteEntry::new(
//!         dest.parse().unwrap(),
//!         "192.0.2.1".parse().unwrap(),
//!         zone,
//!         HardwareId::from_object_id("GigabitEthernet0_API_SLASH_0"),
//!     )
//! };
//! let table = RouteTable::from_entries(vec![
//!     route("10.0.0.0/8", "inside"),
//!     route("0.0.0.0/0", "outside"),
//! ]);
//! assert_eq!(table.resolve_zone("10.1.2.3").unwrap().zone(), "inside");
//! ```

pub mod capability;
pub mod classify;
pub mod group;
pub mod naming;
pub mod pipeline;
pub mod route;
pub mod rule;
pub mod wire;

pub use capability::{
    LookupError, ObjectLookup, PositionError, PositionSource, SessionContext, SubmitOutcome,
    Submitter,
};
pub use classify::{field_key_for, AddressClassifier, AddressKind, FieldKey, FieldKind, ServiceKind};
pub use group::{
    check_group_homogeneity, resolve_group_zone, GroupMember, GroupZone, ZoneMismatch,
    ZoneResolutionError,
};
pub use naming::{object_name, NetworkObjectDraft};
pub use pipeline::{
    FailureReason, PipelineOptions, ProvisioningPipeline, ProvisioningRequest, RowOutcome,
    RowStage, RowStatus,
};
pub use route::{HardwareId, RawRoute, ResolveError, RouteEntry, RouteParseError, RouteTable};
pub use rule::{AclEntry, AclRule, AclRuleBuilder, RuleField, RuleLogging, WireAce, WireRule};
pub use wire::{ItemList, WireValue};
