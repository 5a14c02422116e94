//! Collaborators the engine calls out to.
//!
//! The engine never talks to an appliance itself. Object lookups, ACL position
//! queries and rule submission are capabilities handed in by the caller; a
//! REST client, a saved snapshot or a test double can all stand behind them.
//! Every call receives the [`SessionContext`] of the current batch run.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::group::GroupMember;
use crate::rule::AclRule;

/// Per-run session state passed explicitly to every capability call.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub appliance: String,
    pub auth_token: Option<String>,
}

impl SessionContext {
    pub fn new(appliance: impl Into<String>) -> Self {
        Self {
            appliance: appliance.into(),
            auth_token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("appliance", &self.appliance)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("object '{object_id}' not found")]
    NotFound { object_id: String },
    #[error("object '{object_id}' has no usable address: {reason}")]
    Unusable { object_id: String, reason: String },
    #[error("object lookup failed: {reason}")]
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("zone '{zone}' has no inbound ACL")]
    ZoneNotFound { zone: String },
    #[error("could not read inbound ACL for zone '{zone}': {reason}")]
    Unavailable { zone: String, reason: String },
}

/// Resolves named objects and object groups.
pub trait ObjectLookup {
    /// Members of a network object group, in the order the store returns them.
    fn group_members(
        &self,
        ctx: &SessionContext,
        group: &str,
    ) -> Result<Vec<GroupMember>, LookupError>;

    /// Concrete address literal behind an object (or one-level group) reference.
    fn object_address(&self, ctx: &SessionContext, object_id: &str)
        -> Result<String, LookupError>;
}

/// Reports where the last rule of a zone's inbound ACL sits.
pub trait PositionSource {
    fn last_position(&self, ctx: &SessionContext, zone: &str) -> Result<u32, PositionError>;
}

/// Hands a built rule to the appliance.
///
/// Ordinary rejections are returned as a non-`ok` [`SubmitOutcome`], never as
/// a panic or error.
pub trait Submitter {
    fn submit(&self, ctx: &SessionContext, zone: &str, rule: &AclRule) -> SubmitOutcome;
}

/// Result of one submission, kept verbatim for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitOutcome {
    pub ok: bool,
    pub status_code: u16,
    pub reason: String,
    pub content: String,
}

impl SubmitOutcome {
    pub fn created() -> Self {
        Self {
            ok: true,
            status_code: 201,
            reason: "Created".to_string(),
            content: String::new(),
        }
    }

    pub fn rejected(
        status_code: u16,
        reason: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            ok: false,
            status_code,
            reason: reason.into(),
            content: content.into(),
        }
    }
}
