//! The built-in policy set.
//!
//! Everything here is ordinary registered data; operators can replace any of
//! it by registering their own policies at startup. Sensitive-resource access
//! for proxy personas in particular is controlled by which of these policies
//! get registered and at what priority, never by hardcoded branches.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use gateway_security::{AuthType, Persona, Sensitivity};

use crate::policy::{Decision, PolicyRequest, ResourcePolicy};

/// Priorities spread out so operators can slot custom policies between them.
mod priority {
    pub const CONFIG_SPECIALIST_DENY: i32 = 1000;
    pub const SELF_OWNER_SENSITIVE: i32 = 110;
    pub const SELF_OWNER: i32 = 100;
    pub const DELEGATE_ASSIGNMENT: i32 = 90;
    pub const CASE_WORKER_SENSITIVE: i32 = 60;
    pub const CASE_WORKER_FULL_ACCESS: i32 = 50;
}

/// Self-service members may access resources their enterprise owns.
pub struct SelfOwnerPolicy;

#[async_trait]
impl ResourcePolicy for SelfOwnerPolicy {
    fn id(&self) -> &str {
        "self-owner"
    }

    fn priority(&self) -> i32 {
        priority::SELF_OWNER
    }

    fn applies_to(&self, request: &PolicyRequest<'_>) -> bool {
        request.subject.persona == Persona::SelfService
            && request.resource.sensitivity == Sensitivity::Normal
    }

    async fn evaluate(&self, request: &PolicyRequest<'_>) -> Decision {
        if request.subject.effective_member_id == request.resource.owner_id {
            Decision::allow("subject's enterprise owns the resource")
        } else {
            Decision::deny(format!(
                "resource owned by '{}' is not owned by the requesting member",
                request.resource.owner_id
            ))
        }
    }
}

/// Sensitive variant of [`SelfOwnerPolicy`]: ownership plus a session-backed
/// credential.
pub struct SelfOwnerSensitivePolicy;

#[async_trait]
impl ResourcePolicy for SelfOwnerSensitivePolicy {
    fn id(&self) -> &str {
        "self-owner-sensitive"
    }

    fn priority(&self) -> i32 {
        priority::SELF_OWNER_SENSITIVE
    }

    fn applies_to(&self, request: &PolicyRequest<'_>) -> bool {
        request.subject.persona == Persona::SelfService
            && request.resource.sensitivity == Sensitivity::Sensitive
    }

    async fn evaluate(&self, request: &PolicyRequest<'_>) -> Decision {
        if request.subject.auth_type != AuthType::Session {
            return Decision::deny("sensitive resources require session authentication");
        }
        if request.subject.effective_member_id == request.resource.owner_id {
            Decision::allow("owning member with session credential")
        } else {
            Decision::deny(format!(
                "sensitive resource owned by '{}' is not owned by the requesting member",
                request.resource.owner_id
            ))
        }
    }
}

/// Delegates may access resources of the enterprise their validated target
/// resolution pointed at.
pub struct DelegateAssignmentPolicy;

#[async_trait]
impl ResourcePolicy for DelegateAssignmentPolicy {
    fn id(&self) -> &str {
        "delegate-assignment"
    }

    fn priority(&self) -> i32 {
        priority::DELEGATE_ASSIGNMENT
    }

    fn applies_to(&self, request: &PolicyRequest<'_>) -> bool {
        request.subject.persona == Persona::Delegate
    }

    async fn evaluate(&self, request: &PolicyRequest<'_>) -> Decision {
        // The gate already validated the assignment window; here only the
        // resource's ownership has to line up with the resolved target.
        if request.subject.effective_member_id == request.resource.owner_id {
            Decision::allow("resource owned by the delegate's validated target")
        } else {
            Decision::deny(format!(
                "resource owned by '{}' is outside the delegate's target '{}'",
                request.resource.owner_id, request.subject.effective_member_id
            ))
        }
    }
}

/// Case workers get unconditional access to normal-sensitivity resources.
pub struct CaseWorkerFullAccessPolicy;

#[async_trait]
impl ResourcePolicy for CaseWorkerFullAccessPolicy {
    fn id(&self) -> &str {
        "case-worker-full-access"
    }

    fn priority(&self) -> i32 {
        priority::CASE_WORKER_FULL_ACCESS
    }

    fn applies_to(&self, request: &PolicyRequest<'_>) -> bool {
        request.subject.persona == Persona::CaseWorker
            && request.subject.auth_type == AuthType::Proxy
            && request.resource.sensitivity == Sensitivity::Normal
    }

    async fn evaluate(&self, _request: &PolicyRequest<'_>) -> Decision {
        Decision::allow("case worker access to normal-sensitivity resources")
    }
}

/// Controls case-worker access to sensitive resources. Registered (or not) by
/// the operator; without it, sensitive access for case workers falls through
/// to the default deny.
pub struct CaseWorkerSensitivePolicy;

#[async_trait]
impl ResourcePolicy for CaseWorkerSensitivePolicy {
    fn id(&self) -> &str {
        "case-worker-sensitive"
    }

    fn priority(&self) -> i32 {
        priority::CASE_WORKER_SENSITIVE
    }

    fn applies_to(&self, request: &PolicyRequest<'_>) -> bool {
        request.subject.persona == Persona::CaseWorker
            && request.subject.auth_type == AuthType::Proxy
            && request.resource.sensitivity == Sensitivity::Sensitive
    }

    async fn evaluate(&self, _request: &PolicyRequest<'_>) -> Decision {
        Decision::allow("case worker access to sensitive resources")
    }
}

/// Unconditional deny for config specialists on the configured resource
/// types. Highest built-in priority so nothing can shadow it.
pub struct ConfigSpecialistResourceDenyPolicy {
    denied_resource_types: BTreeSet<String>,
}

impl ConfigSpecialistResourceDenyPolicy {
    #[must_use]
    pub fn new(denied_resource_types: BTreeSet<String>) -> Self {
        Self {
            denied_resource_types,
        }
    }
}

#[async_trait]
impl ResourcePolicy for ConfigSpecialistResourceDenyPolicy {
    fn id(&self) -> &str {
        "config-specialist-document-deny"
    }

    fn priority(&self) -> i32 {
        priority::CONFIG_SPECIALIST_DENY
    }

    fn applies_to(&self, request: &PolicyRequest<'_>) -> bool {
        request.subject.persona == Persona::ConfigSpecialist
            && self
                .denied_resource_types
                .contains(&request.resource.resource_type)
    }

    async fn evaluate(&self, request: &PolicyRequest<'_>) -> Decision {
        Decision::deny(format!(
            "persona 'config_specialist' may not access resource type '{}'",
            request.resource.resource_type
        ))
    }
}

/// The default registration set.
#[must_use]
pub fn builtin_policy_set(
    config_specialist_denied_resource_types: BTreeSet<String>,
) -> Vec<Arc<dyn ResourcePolicy>> {
    vec![
        Arc::new(ConfigSpecialistResourceDenyPolicy::new(
            config_specialist_denied_resource_types,
        )),
        Arc::new(SelfOwnerSensitivePolicy),
        Arc::new(SelfOwnerPolicy),
        Arc::new(DelegateAssignmentPolicy),
        Arc::new(CaseWorkerSensitivePolicy),
        Arc::new(CaseWorkerFullAccessPolicy),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{PolicyEngine, PolicyOutcome};
    use gateway_security::{Action, ResourceAttributes, SubjectAttributes};

    fn engine() -> PolicyEngine {
        PolicyEngine::builder()
            .register_all(builtin_policy_set(
                ["document".to_owned()].into_iter().collect(),
            ))
            .build()
    }

    fn subject(persona: Persona, auth_type: AuthType, effective: &str) -> SubjectAttributes {
        SubjectAttributes {
            auth_type,
            user_id: "user-1".to_owned(),
            effective_member_id: effective.to_owned(),
            persona,
            delegate_types: BTreeSet::new(),
            partner_id: None,
            operator_id: None,
        }
    }

    fn resource(owner: &str, sensitivity: Sensitivity) -> ResourceAttributes {
        ResourceAttributes {
            resource_type: "document".to_owned(),
            owner_id: owner.to_owned(),
            sensitivity,
            partner_id: None,
        }
    }

    async fn decide(
        subject: &SubjectAttributes,
        resource: &ResourceAttributes,
        action: Action,
    ) -> crate::policy::PolicyDecision {
        engine()
            .decide(&PolicyRequest {
                subject,
                resource,
                action,
            })
            .await
    }

    #[tokio::test]
    async fn self_service_owner_is_allowed() {
        let decision = decide(
            &subject(Persona::SelfService, AuthType::Session, "ENT-001"),
            &resource("ENT-001", Sensitivity::Normal),
            Action::Read,
        )
        .await;
        assert_eq!(decision.outcome, PolicyOutcome::Allow);
        assert_eq!(decision.policy_id.as_deref(), Some("self-owner"));
    }

    #[tokio::test]
    async fn self_service_non_owner_is_denied() {
        let decision = decide(
            &subject(Persona::SelfService, AuthType::Session, "ENT-001"),
            &resource("ENT-999", Sensitivity::Normal),
            Action::Read,
        )
        .await;
        assert_eq!(decision.outcome, PolicyOutcome::Deny);
        assert_eq!(decision.policy_id.as_deref(), Some("self-owner"));
    }

    #[tokio::test]
    async fn sensitive_self_access_requires_session_credential() {
        let allowed = decide(
            &subject(Persona::SelfService, AuthType::Session, "ENT-001"),
            &resource("ENT-001", Sensitivity::Sensitive),
            Action::Read,
        )
        .await;
        assert_eq!(allowed.policy_id.as_deref(), Some("self-owner-sensitive"));
        assert!(allowed.is_allowed());

        let denied = decide(
            &subject(Persona::SelfService, AuthType::Proxy, "ENT-001"),
            &resource("ENT-001", Sensitivity::Sensitive),
            Action::Read,
        )
        .await;
        assert_eq!(denied.outcome, PolicyOutcome::Deny);
    }

    #[tokio::test]
    async fn delegate_allowed_only_inside_resolved_target() {
        let allowed = decide(
            &subject(Persona::Delegate, AuthType::Session, "ENT-TARGET"),
            &resource("ENT-TARGET", Sensitivity::Normal),
            Action::Write,
        )
        .await;
        assert_eq!(allowed.policy_id.as_deref(), Some("delegate-assignment"));
        assert!(allowed.is_allowed());

        let denied = decide(
            &subject(Persona::Delegate, AuthType::Session, "ENT-TARGET"),
            &resource("ENT-OTHER", Sensitivity::Normal),
            Action::Write,
        )
        .await;
        assert_eq!(denied.outcome, PolicyOutcome::Deny);
    }

    #[tokio::test]
    async fn case_worker_has_full_normal_access_and_policy_backed_sensitive_access() {
        let normal = decide(
            &subject(Persona::CaseWorker, AuthType::Proxy, "member-42"),
            &resource("ENT-ANY", Sensitivity::Normal),
            Action::Read,
        )
        .await;
        assert_eq!(normal.policy_id.as_deref(), Some("case-worker-full-access"));
        assert!(normal.is_allowed());

        let sensitive = decide(
            &subject(Persona::CaseWorker, AuthType::Proxy, "member-42"),
            &resource("ENT-ANY", Sensitivity::Sensitive),
            Action::Read,
        )
        .await;
        assert_eq!(sensitive.policy_id.as_deref(), Some("case-worker-sensitive"));
        assert!(sensitive.is_allowed());
    }

    #[tokio::test]
    async fn case_worker_sensitive_access_falls_to_default_deny_without_the_policy() {
        let engine = PolicyEngine::builder()
            .register(Arc::new(CaseWorkerFullAccessPolicy))
            .build();
        let subject = subject(Persona::CaseWorker, AuthType::Proxy, "member-42");
        let resource = resource("ENT-ANY", Sensitivity::Sensitive);
        let decision = engine
            .decide(&PolicyRequest {
                subject: &subject,
                resource: &resource,
                action: Action::Read,
            })
            .await;
        assert_eq!(decision.outcome, PolicyOutcome::NotApplicable);
        assert_eq!(decision.reason, "no applicable policy");
    }

    #[tokio::test]
    async fn config_specialist_document_deny_shadows_everything() {
        let decision = decide(
            &subject(Persona::ConfigSpecialist, AuthType::Proxy, "member-42"),
            &resource("member-42", Sensitivity::Normal),
            Action::Read,
        )
        .await;
        assert_eq!(decision.outcome, PolicyOutcome::Deny);
        assert_eq!(
            decision.policy_id.as_deref(),
            Some("config-specialist-document-deny")
        );
    }

    #[tokio::test]
    async fn agent_has_no_builtin_grant() {
        let decision = decide(
            &subject(Persona::Agent, AuthType::Proxy, "member-42"),
            &resource("member-42", Sensitivity::Normal),
            Action::Read,
        )
        .await;
        assert_eq!(decision.outcome, PolicyOutcome::NotApplicable);
    }
}
