//! The persisted session record and its delegate grants.

use std::collections::BTreeSet;
use std::fmt;
use std::net::IpAddr;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use gateway_security::{DelegateType, Persona};
use rand::RngCore as _;
use serde::{Deserialize, Serialize};

/// Generate an unguessable session id: 256 bits of OS randomness,
/// base64url-encoded without padding.
#[must_use]
pub fn new_session_id() -> String {
    let mut buf = [0u8; 32];
    rand::rng().fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}

/// A delegate authorization toward one target enterprise, valid inside an
/// effective date window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateGrant {
    pub target_enterprise_id: String,
    pub delegate_types: BTreeSet<DelegateType>,
    pub effective_from: DateTime<Utc>,
    /// Open-ended grant when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_until: Option<DateTime<Utc>>,
}

impl DelegateGrant {
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.effective_from && self.effective_until.is_none_or(|until| now < until)
    }
}

/// Server-side session state created at login and removed at logout or expiry.
///
/// Serialized only toward the session backend; no field of this struct ever
/// travels to a browser. The cookie carries the opaque `session_id` alone.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub user_id: String,
    pub enterprise_id: String,
    pub persona: Persona,
    #[serde(default)]
    pub delegate_grants: Vec<DelegateGrant>,
    /// Client IP captured at session creation, for binding validation.
    pub client_ip: Option<IpAddr>,
    /// Device fingerprint captured at session creation.
    pub device_fingerprint: Option<String>,
    /// Opaque upstream token material (e.g. the identity provider's tokens),
    /// held server-side only.
    pub token_material: String,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Delegate types granted toward `target` that are active at `now`.
    #[must_use]
    pub fn delegate_types_for(&self, target: &str, now: DateTime<Utc>) -> BTreeSet<DelegateType> {
        self.delegate_grants
            .iter()
            .filter(|g| g.target_enterprise_id == target && g.is_active_at(now))
            .flat_map(|g| g.delegate_types.iter().copied())
            .collect()
    }

    /// Union of delegate types across all currently active grants.
    #[must_use]
    pub fn active_delegate_types(&self, now: DateTime<Utc>) -> BTreeSet<DelegateType> {
        self.delegate_grants
            .iter()
            .filter(|g| g.is_active_at(now))
            .flat_map(|g| g.delegate_types.iter().copied())
            .collect()
    }
}

impl fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRecord")
            .field("session_id", &self.session_id)
            .field("user_id", &self.user_id)
            .field("enterprise_id", &self.enterprise_id)
            .field("persona", &self.persona)
            .field("delegate_grants", &self.delegate_grants)
            .field("client_ip", &self.client_ip)
            .field("device_fingerprint", &self.device_fingerprint)
            .field("token_material", &"<redacted>")
            .field("created_at", &self.created_at)
            .field("last_accessed_at", &self.last_accessed_at)
            .finish()
    }
}
