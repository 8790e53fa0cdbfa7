//! ABAC-facing attribute projections.
//!
//! Policies see subjects and resources only through these structs, never
//! through raw headers or session records.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::persona::{AuthType, DelegateType, Persona};

/// The subject side of an ABAC evaluation, projected from `AuthContext`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectAttributes {
    pub auth_type: AuthType,
    pub user_id: String,
    /// Identity whose data the request acts upon (post target resolution).
    pub effective_member_id: String,
    pub persona: Persona,
    /// Delegate grants in effect; empty unless persona is `Delegate`.
    pub delegate_types: BTreeSet<DelegateType>,
    pub partner_id: Option<String>,
    pub operator_id: Option<String>,
}

/// Sensitivity classification of a resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sensitivity {
    #[default]
    Normal,
    Sensitive,
}

/// The resource side of an ABAC evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceAttributes {
    /// Resource type tag (e.g. `document`, `claim`).
    pub resource_type: String,
    /// Enterprise id that owns the resource.
    pub owner_id: String,
    #[serde(default)]
    pub sensitivity: Sensitivity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<String>,
}

/// The operation being attempted on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Read,
    Write,
    Delete,
}

impl Action {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
