//! Management API payload shapes shared by routes, object groups and ACLs.

use serde::{Deserialize, Serialize};

/// A `{kind, value}` or `{kind, objectId}` pair as the management API emits it.
///
/// Which of the two keys is present depends on the kind: `objectRef#…` kinds
/// carry `objectId`, all others carry `value`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireValue {
    #[serde(default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
}

impl WireValue {
    pub fn by_value(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: Some(value.into()),
            object_id: None,
        }
    }

    pub fn by_reference(kind: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: None,
            object_id: Some(object_id.into()),
        }
    }

    pub fn is_reference(&self) -> bool {
        self.kind.contains("objectRef")
    }

    /// The literal this value stands for, read from the key its kind selects.
    ///
    /// `AnyIPAddress` renders as `any` whatever its `value` says.
    pub fn literal(&self) -> Option<&str> {
        if self.kind == "AnyIPAddress" {
            return Some("any");
        }
        if self.is_reference() {
            self.object_id.as_deref()
        } else {
            self.value.as_deref()
        }
    }
}

/// Envelope of every list endpoint: `{"items": [...]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemList<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}
