//! `AuthContext` — the immutable, per-request identity record produced by
//! dual-authentication resolution.
//!
//! Built once by the resolver and carried through the request via axum
//! extensions. Never mutated after construction: delegate target resolution
//! produces a new, enriched value instead of editing the original. Never
//! persisted — the session record is the durable artifact, this is not.

use std::collections::BTreeSet;

use crate::attributes::SubjectAttributes;
use crate::persona::{AuthType, DelegateType, Persona};

/// Resolved identity for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    auth_type: AuthType,
    user_id: String,
    effective_member_id: String,
    persona: Persona,
    delegate_types: BTreeSet<DelegateType>,
    session_id: Option<String>,
    partner_id: Option<String>,
    operator_id: Option<String>,
}

impl AuthContext {
    #[must_use]
    pub fn builder() -> AuthContextBuilder {
        AuthContextBuilder::default()
    }

    #[must_use]
    pub fn auth_type(&self) -> AuthType {
        self.auth_type
    }

    /// The authenticated identity (who logged in / who the partner asserted).
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The identity whose data this request may act upon.
    ///
    /// Equal to the authenticated identity except for delegates, where target
    /// resolution replaces it with the validated target enterprise id.
    #[must_use]
    pub fn effective_member_id(&self) -> &str {
        &self.effective_member_id
    }

    #[must_use]
    pub fn persona(&self) -> Persona {
        self.persona
    }

    /// Delegate grants in effect. Populated only for [`Persona::Delegate`].
    #[must_use]
    pub fn delegate_types(&self) -> &BTreeSet<DelegateType> {
        &self.delegate_types
    }

    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    #[must_use]
    pub fn partner_id(&self) -> Option<&str> {
        self.partner_id.as_deref()
    }

    #[must_use]
    pub fn operator_id(&self) -> Option<&str> {
        self.operator_id.as_deref()
    }

    /// Project this context into the ABAC-facing subject attributes.
    ///
    /// Pure derivation; computed once per evaluation.
    #[must_use]
    pub fn subject_attributes(&self) -> SubjectAttributes {
        SubjectAttributes {
            auth_type: self.auth_type,
            user_id: self.user_id.clone(),
            effective_member_id: self.effective_member_id.clone(),
            persona: self.persona,
            delegate_types: self.delegate_types.clone(),
            partner_id: self.partner_id.clone(),
            operator_id: self.operator_id.clone(),
        }
    }

    /// Produce a new context with the effective identity replaced by a
    /// validated delegate target. The original is left untouched.
    #[must_use]
    pub fn with_effective_member_id(&self, target: impl Into<String>) -> Self {
        Self {
            effective_member_id: target.into(),
            ..self.clone()
        }
    }
}

/// Builder for [`AuthContext`].
#[derive(Debug, Default)]
pub struct AuthContextBuilder {
    auth_type: Option<AuthType>,
    user_id: Option<String>,
    effective_member_id: Option<String>,
    persona: Option<Persona>,
    delegate_types: BTreeSet<DelegateType>,
    session_id: Option<String>,
    partner_id: Option<String>,
    operator_id: Option<String>,
}

/// A builder was finalized without one of the mandatory identity fields.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("auth context is missing required field '{0}'")]
pub struct IncompleteContext(pub &'static str);

impl AuthContextBuilder {
    #[must_use]
    pub fn auth_type(mut self, auth_type: AuthType) -> Self {
        self.auth_type = Some(auth_type);
        self
    }

    #[must_use]
    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    #[must_use]
    pub fn effective_member_id(mut self, id: impl Into<String>) -> Self {
        self.effective_member_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn persona(mut self, persona: Persona) -> Self {
        self.persona = Some(persona);
        self
    }

    #[must_use]
    pub fn delegate_types(mut self, types: impl IntoIterator<Item = DelegateType>) -> Self {
        self.delegate_types = types.into_iter().collect();
        self
    }

    #[must_use]
    pub fn session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn partner_id(mut self, id: impl Into<String>) -> Self {
        self.partner_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn operator_id(mut self, id: impl Into<String>) -> Self {
        self.operator_id = Some(id.into());
        self
    }

    /// Finalize the context.
    ///
    /// # Errors
    ///
    /// Returns [`IncompleteContext`] when auth type, user id, persona, or a
    /// non-empty effective member id is absent. Resolution must fail closed
    /// rather than fabricate identity defaults.
    pub fn build(self) -> Result<AuthContext, IncompleteContext> {
        let auth_type = self.auth_type.ok_or(IncompleteContext("auth_type"))?;
        let user_id = self.user_id.ok_or(IncompleteContext("user_id"))?;
        let persona = self.persona.ok_or(IncompleteContext("persona"))?;
        let effective_member_id = self
            .effective_member_id
            .or_else(|| Some(user_id.clone()))
            .filter(|id| !id.is_empty())
            .ok_or(IncompleteContext("effective_member_id"))?;
        if user_id.is_empty() {
            return Err(IncompleteContext("user_id"));
        }
        // Delegate grants are meaningless on any other persona; drop them so
        // downstream checks cannot be confused by stray grants.
        let delegate_types = if persona == Persona::Delegate {
            self.delegate_types
        } else {
            BTreeSet::new()
        };
        Ok(AuthContext {
            auth_type,
            user_id,
            effective_member_id,
            persona,
            delegate_types,
            session_id: self.session_id,
            partner_id: self.partner_id,
            operator_id: self.operator_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_context() -> AuthContext {
        AuthContext::builder()
            .auth_type(AuthType::Session)
            .user_id("user-123")
            .effective_member_id("ENT-001")
            .persona(Persona::SelfService)
            .session_id("sess-abc")
            .build()
            .unwrap()
    }

    #[test]
    fn builder_defaults_effective_id_to_user_id() {
        let ctx = AuthContext::builder()
            .auth_type(AuthType::Proxy)
            .user_id("member-9")
            .persona(Persona::CaseWorker)
            .build()
            .unwrap();
        assert_eq!(ctx.effective_member_id(), "member-9");
    }

    #[test]
    fn builder_rejects_missing_required_fields() {
        let err = AuthContext::builder()
            .user_id("u")
            .persona(Persona::SelfService)
            .build()
            .unwrap_err();
        assert_eq!(err, IncompleteContext("auth_type"));

        let err = AuthContext::builder()
            .auth_type(AuthType::Session)
            .user_id("")
            .persona(Persona::SelfService)
            .effective_member_id("e")
            .build()
            .unwrap_err();
        assert_eq!(err, IncompleteContext("user_id"));
    }

    #[test]
    fn builder_rejects_empty_effective_id() {
        let err = AuthContext::builder()
            .auth_type(AuthType::Session)
            .user_id("user-123")
            .effective_member_id("")
            .persona(Persona::SelfService)
            .build()
            .unwrap_err();
        assert_eq!(err, IncompleteContext("effective_member_id"));
    }

    #[test]
    fn delegate_types_dropped_for_non_delegate_personas() {
        let ctx = AuthContext::builder()
            .auth_type(AuthType::Session)
            .user_id("user-123")
            .persona(Persona::SelfService)
            .delegate_types([DelegateType::Daa, DelegateType::Rpr])
            .build()
            .unwrap();
        assert!(ctx.delegate_types().is_empty());

        let ctx = AuthContext::builder()
            .auth_type(AuthType::Session)
            .user_id("user-123")
            .persona(Persona::Delegate)
            .delegate_types([DelegateType::Daa, DelegateType::Rpr])
            .build()
            .unwrap();
        assert_eq!(ctx.delegate_types().len(), 2);
    }

    #[test]
    fn enrichment_produces_a_new_value() {
        let original = session_context();
        let enriched = original.with_effective_member_id("ENT-777");
        assert_eq!(original.effective_member_id(), "ENT-001");
        assert_eq!(enriched.effective_member_id(), "ENT-777");
        assert_eq!(enriched.user_id(), original.user_id());
        assert_eq!(enriched.session_id(), original.session_id());
    }

    #[test]
    fn subject_attributes_projection() {
        let attrs = session_context().subject_attributes();
        assert_eq!(attrs.auth_type, AuthType::Session);
        assert_eq!(attrs.user_id, "user-123");
        assert_eq!(attrs.effective_member_id, "ENT-001");
        assert_eq!(attrs.persona, Persona::SelfService);
        assert!(attrs.delegate_types.is_empty());
    }
}
