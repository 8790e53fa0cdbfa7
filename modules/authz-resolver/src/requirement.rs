//! Declarative per-endpoint authorization requirements.
//!
//! Requirements are explicit data attached to each route at startup. Nothing
//! is inferred from handler signatures or naming conventions, so the full
//! security posture of the router is auditable in one place.

use std::collections::BTreeSet;

use gateway_security::{DelegateType, Persona};

/// What an endpoint demands of an already-authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRequirement {
    /// Personas allowed to call this endpoint. An empty set denies everyone;
    /// routes must always state their audience.
    pub allowed_personas: Vec<Persona>,
    /// Delegate types a `Delegate` caller must hold, all of them. Ignored for
    /// other personas.
    pub required_delegate_types: BTreeSet<DelegateType>,
    /// Resource type this endpoint serves, used for blanket per-persona
    /// resource-type denials.
    pub resource_type: Option<String>,
}

impl EndpointRequirement {
    /// Requirement allowing the given personas with no delegate-type demands.
    #[must_use]
    pub fn allowing(personas: impl IntoIterator<Item = Persona>) -> Self {
        Self {
            allowed_personas: personas.into_iter().collect(),
            required_delegate_types: BTreeSet::new(),
            resource_type: None,
        }
    }

    #[must_use]
    pub fn with_delegate_types(
        mut self,
        types: impl IntoIterator<Item = DelegateType>,
    ) -> Self {
        self.required_delegate_types = types.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    #[must_use]
    pub fn permits_persona(&self, persona: Persona) -> bool {
        self.allowed_personas.contains(&persona)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_requirement_permits_nobody() {
        let req = EndpointRequirement::allowing([]);
        assert!(!req.permits_persona(Persona::SelfService));
        assert!(!req.permits_persona(Persona::CaseWorker));
    }

    #[test]
    fn builder_composes() {
        let req = EndpointRequirement::allowing([Persona::Delegate])
            .with_delegate_types([DelegateType::Daa, DelegateType::Roi])
            .with_resource_type("document");
        assert!(req.permits_persona(Persona::Delegate));
        assert_eq!(req.required_delegate_types.len(), 2);
        assert_eq!(req.resource_type.as_deref(), Some("document"));
    }
}
