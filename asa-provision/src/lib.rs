//! Offline provisioning front end for `asa-policy-core`.
//!
//! The library side of the `asa-provision` binary:
//!
//! - [`config`]: TOML settings with embedded defaults
//! - [`snapshot`]: saved appliance state that answers lookups, position
//!   queries and dry-run submissions
//! - [`rule_list`]: CSV rule lists
//! - [`report`]: terminal and JSON rendering of outcomes
//!
//! Zone resolution, rule encoding and the provisioning pipeline live in
//! `asa-policy-core`; this crate only feeds them and prints what they return.

pub mod config;
pub mod report;
pub mod rule_list;
pub mod snapshot;
