//! The persona authorization gate.
//!
//! Runs after authentication and before any handler logic. Checks are ordered
//! and short-circuit: persona membership, blanket resource-type denials,
//! delegate-type coverage, then target resolution. The gate never widens the
//! effective identity — it only narrows or replaces it with a validated
//! delegate target.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use gateway_errors::AuthError;
use gateway_security::{AuthContext, DelegateType, Persona};

use crate::config::AuthzConfig;
use crate::permissions::PermissionsSource;
use crate::requirement::EndpointRequirement;

/// Enforces [`EndpointRequirement`]s against a resolved [`AuthContext`].
pub struct PersonaAuthorizationGate {
    permissions: Arc<dyn PermissionsSource>,
    config: AuthzConfig,
}

impl PersonaAuthorizationGate {
    #[must_use]
    pub fn new(permissions: Arc<dyn PermissionsSource>, config: AuthzConfig) -> Self {
        Self {
            permissions,
            config,
        }
    }

    /// Authorize the caller for this endpoint and resolve the effective
    /// identity.
    ///
    /// `asserted_target` is the client-supplied target member id (query
    /// parameter on reads, validated body field on writes). Returns the
    /// context to carry forward: unchanged for most personas, enriched with
    /// the validated target for delegates.
    ///
    /// # Errors
    ///
    /// Typed [`AuthError`] per check; a self-service caller asserting a
    /// foreign target is a [`AuthError::SecurityIncident`].
    #[tracing::instrument(skip_all, fields(persona = %ctx.persona()))]
    pub async fn authorize(
        &self,
        ctx: &AuthContext,
        requirement: &EndpointRequirement,
        asserted_target: Option<&str>,
    ) -> Result<AuthContext, AuthError> {
        self.screen(ctx, requirement)?;

        match ctx.persona() {
            Persona::Delegate => self.resolve_delegate(ctx, requirement, asserted_target).await,
            Persona::SelfService => check_self_target(ctx, asserted_target),
            // Proxy personas act under their header-asserted identity; any
            // client-supplied target is ignored.
            Persona::Agent | Persona::CaseWorker | Persona::ConfigSpecialist => Ok(ctx.clone()),
        }
    }

    /// The synchronous checks alone: persona membership, blanket
    /// resource-type denials, and delegate-type coverage against the
    /// session's own grants.
    ///
    /// Routes whose delegate target travels in the request body run this from
    /// the middleware and finish with [`Self::authorize`] in the handler once
    /// the body is parsed.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`Self::authorize`], minus the target-resolution
    /// failures.
    pub fn screen(
        &self,
        ctx: &AuthContext,
        requirement: &EndpointRequirement,
    ) -> Result<(), AuthError> {
        if !requirement.permits_persona(ctx.persona()) {
            return Err(AuthError::PersonaNotAuthorized {
                actual: ctx.persona(),
                required: requirement.allowed_personas.clone(),
            });
        }

        if ctx.persona() == Persona::ConfigSpecialist
            && let Some(resource_type) = &requirement.resource_type
            && self
                .config
                .config_specialist_denied_resource_types
                .contains(resource_type)
        {
            return Err(AuthError::PolicyDenied {
                policy_id: None,
                reason: format!(
                    "persona '{}' may not access resource type '{resource_type}'",
                    ctx.persona()
                ),
            });
        }

        if ctx.persona() == Persona::Delegate {
            // Coverage against the session's own grants; a delegate who never
            // holds the required types fails fast without a lookup.
            check_coverage(&requirement.required_delegate_types, ctx.delegate_types())?;
        }
        Ok(())
    }

    async fn resolve_delegate(
        &self,
        ctx: &AuthContext,
        requirement: &EndpointRequirement,
        asserted_target: Option<&str>,
    ) -> Result<AuthContext, AuthError> {
        let Some(target) = asserted_target else {
            return Err(AuthError::MalformedInput {
                message: "delegate requests must name a target member id".to_owned(),
            });
        };

        let granted = self.lookup_grant(ctx.user_id(), target).await?;
        if granted.is_empty() {
            return Err(AuthError::PersonaNotAuthorized {
                actual: ctx.persona(),
                required: requirement.allowed_personas.clone(),
            });
        }
        check_coverage(&requirement.required_delegate_types, &granted)?;

        Ok(ctx.with_effective_member_id(target))
    }

    async fn lookup_grant(
        &self,
        user_id: &str,
        target: &str,
    ) -> Result<BTreeSet<DelegateType>, AuthError> {
        let lookup = self.permissions.delegate_types_for(user_id, target, Utc::now());
        match tokio::time::timeout(self.config.permissions_timeout(), lookup).await {
            Ok(Ok(types)) => Ok(types),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "permissions lookup failed");
                Err(AuthError::DependencyUnavailable {
                    dependency: "permissions-source".to_owned(),
                    timed_out: false,
                })
            }
            Err(_) => Err(AuthError::DependencyUnavailable {
                dependency: "permissions-source".to_owned(),
                timed_out: true,
            }),
        }
    }
}

fn check_coverage(
    required: &BTreeSet<DelegateType>,
    held: &BTreeSet<DelegateType>,
) -> Result<(), AuthError> {
    let missing: BTreeSet<DelegateType> = required.difference(held).copied().collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AuthError::MissingDelegateTypes { missing })
    }
}

fn check_self_target(
    ctx: &AuthContext,
    asserted_target: Option<&str>,
) -> Result<AuthContext, AuthError> {
    match asserted_target {
        Some(target) if target != ctx.effective_member_id() => {
            Err(AuthError::SecurityIncident {
                logged_in_member_id: ctx.user_id().to_owned(),
                attempted_enterprise_id: target.to_owned(),
            })
        }
        _ => Ok(ctx.clone()),
    }
}
