//! The identity source stub backing the login endpoint.
//!
//! Real deployments exchange tokens with an identity provider; that exchange
//! is out of scope here, so logins verify against a configured directory and
//! delegate grants are materialized from the configured assignment table.

use chrono::{DateTime, Utc};
use gateway_security::Persona;
use session_store::DelegateGrant;

use crate::config::{AssignmentSeed, IdentitySeed};

/// A verified login.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    pub user_id: String,
    pub enterprise_id: String,
    pub persona: Persona,
    pub delegate_grants: Vec<DelegateGrant>,
}

/// Config-seeded username/password directory.
#[derive(Debug, Default)]
pub struct IdentityDirectory {
    identities: Vec<IdentitySeed>,
    assignments: Vec<AssignmentSeed>,
}

impl IdentityDirectory {
    #[must_use]
    pub fn new(identities: Vec<IdentitySeed>, assignments: Vec<AssignmentSeed>) -> Self {
        Self {
            identities,
            assignments,
        }
    }

    /// Verify a username/password pair and assemble the identity it maps to,
    /// including the delegate grants assigned to that user.
    #[must_use]
    pub fn verify(&self, username: &str, password: &str) -> Option<VerifiedIdentity> {
        let entry = self
            .identities
            .iter()
            .find(|i| i.username == username && i.password == password)?;
        Some(VerifiedIdentity {
            user_id: entry.user_id.clone(),
            enterprise_id: entry.enterprise_id.clone(),
            persona: entry.persona,
            delegate_grants: self.grants_for(&entry.user_id),
        })
    }

    fn grants_for(&self, user_id: &str) -> Vec<DelegateGrant> {
        self.assignments
            .iter()
            .filter(|a| a.delegate_user_id == user_id)
            .map(|a| DelegateGrant {
                target_enterprise_id: a.target_enterprise_id.clone(),
                delegate_types: a.delegate_types.iter().copied().collect(),
                effective_from: a.effective_from.unwrap_or(DateTime::<Utc>::MIN_UTC),
                effective_until: a.effective_until,
            })
            .collect()
    }
}
