//! The ABAC policy engine.
//!
//! Policies are registered once at startup; the built registry is immutable
//! and shared via `Arc`. Evaluation picks exactly one authoritative policy:
//! the applicable one with the highest priority, first-registered winning
//! ties. No applicable policy means deny.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use gateway_errors::AuthError;
use gateway_security::{Action, ResourceAttributes, SubjectAttributes};

/// One evaluation request: subject, resource, action.
#[derive(Debug, Clone, Copy)]
pub struct PolicyRequest<'a> {
    pub subject: &'a SubjectAttributes,
    pub resource: &'a ResourceAttributes,
    pub action: Action,
}

/// What the authoritative policy decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow { reason: String },
    Deny { reason: String },
}

impl Decision {
    #[must_use]
    pub fn allow(reason: impl Into<String>) -> Self {
        Self::Allow {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn deny(reason: impl Into<String>) -> Self {
        Self::Deny {
            reason: reason.into(),
        }
    }
}

/// Outcome tag of a finished evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyOutcome {
    Allow,
    Deny,
    /// No registered policy applied; the engine denied by default.
    NotApplicable,
}

impl fmt::Display for PolicyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
            Self::NotApplicable => "not_applicable",
        })
    }
}

/// The engine's final, authoritative answer for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    pub outcome: PolicyOutcome,
    /// Id of the policy that decided, absent for the default deny.
    pub policy_id: Option<String>,
    /// Full reason; logged server-side, sanitized before any client excerpt.
    pub reason: String,
}

impl PolicyDecision {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.outcome == PolicyOutcome::Allow
    }
}

/// One attribute-based access policy.
///
/// `applies_to` is a cheap synchronous filter; `evaluate` may consult async
/// collaborators and is called on at most one policy per request.
#[async_trait]
pub trait ResourcePolicy: Send + Sync {
    fn id(&self) -> &str;

    /// Higher wins. Ties resolve to registration order.
    fn priority(&self) -> i32;

    fn applies_to(&self, request: &PolicyRequest<'_>) -> bool;

    async fn evaluate(&self, request: &PolicyRequest<'_>) -> Decision;
}

/// Collects policies before freezing them into a [`PolicyEngine`].
#[derive(Default)]
pub struct PolicyEngineBuilder {
    policies: Vec<Arc<dyn ResourcePolicy>>,
}

impl PolicyEngineBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn register(mut self, policy: Arc<dyn ResourcePolicy>) -> Self {
        self.policies.push(policy);
        self
    }

    #[must_use]
    pub fn register_all(
        mut self,
        policies: impl IntoIterator<Item = Arc<dyn ResourcePolicy>>,
    ) -> Self {
        self.policies.extend(policies);
        self
    }

    /// Freeze the registry. Policies sharing a priority keep registration
    /// order but get flagged at startup, since the tie-break is easy to rely
    /// on by accident.
    #[must_use]
    pub fn build(mut self) -> PolicyEngine {
        // Stable sort preserves registration order within equal priorities.
        self.policies.sort_by_key(|p| std::cmp::Reverse(p.priority()));
        for pair in self.policies.windows(2) {
            if pair[0].priority() == pair[1].priority() {
                tracing::warn!(
                    event = "authz.duplicate_policy_priority",
                    priority = pair[0].priority(),
                    first = pair[0].id(),
                    second = pair[1].id(),
                    "policies share a priority; registration order decides between them"
                );
            }
        }
        PolicyEngine {
            policies: self.policies,
        }
    }
}

/// Immutable, shareable policy registry.
pub struct PolicyEngine {
    policies: Vec<Arc<dyn ResourcePolicy>>,
}

impl PolicyEngine {
    #[must_use]
    pub fn builder() -> PolicyEngineBuilder {
        PolicyEngineBuilder::new()
    }

    /// Produce the single authoritative decision for this request.
    #[tracing::instrument(skip_all, fields(action = %request.action, resource_type = %request.resource.resource_type))]
    pub async fn decide(&self, request: &PolicyRequest<'_>) -> PolicyDecision {
        let Some(policy) = self.policies.iter().find(|p| p.applies_to(request)) else {
            return PolicyDecision {
                outcome: PolicyOutcome::NotApplicable,
                policy_id: None,
                reason: "no applicable policy".to_owned(),
            };
        };
        let decision = match policy.evaluate(request).await {
            Decision::Allow { reason } => PolicyDecision {
                outcome: PolicyOutcome::Allow,
                policy_id: Some(policy.id().to_owned()),
                reason,
            },
            Decision::Deny { reason } => PolicyDecision {
                outcome: PolicyOutcome::Deny,
                policy_id: Some(policy.id().to_owned()),
                reason,
            },
        };
        tracing::debug!(
            event = "authz.policy_decision",
            policy_id = decision.policy_id.as_deref().unwrap_or("-"),
            outcome = %decision.outcome,
            reason = %decision.reason,
            "policy evaluated"
        );
        decision
    }

    /// Decide and convert any non-allow into the boundary error.
    ///
    /// # Errors
    ///
    /// [`AuthError::PolicyDenied`] carrying the deciding policy id (absent
    /// for the default deny) and the full reason.
    pub async fn authorize(&self, request: &PolicyRequest<'_>) -> Result<PolicyDecision, AuthError> {
        let decision = self.decide(request).await;
        if decision.is_allowed() {
            Ok(decision)
        } else {
            Err(AuthError::PolicyDenied {
                policy_id: decision.policy_id,
                reason: decision.reason,
            })
        }
    }
}
