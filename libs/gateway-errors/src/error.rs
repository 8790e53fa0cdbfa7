//! The authorization error taxonomy.
//!
//! Every validator and gate in the pipeline raises one of these variants;
//! nothing else in the workspace formats an HTTP error response. The boundary
//! translator in [`crate::response`] maps the taxonomy to status codes and a
//! sanitized client body, while full detail stays in server-side logs.

use std::collections::BTreeSet;

use gateway_security::{AuthType, DelegateType, Persona};
use http::StatusCode;
use thiserror::Error;

/// Typed failure from credential resolution, gating, or policy evaluation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No usable credential (neither session cookie nor complete partner
    /// header set) was presented on a protected route.
    #[error("no credential presented")]
    MissingCredential,

    /// Login was attempted with credentials the identity source rejects.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The session cookie referenced a session that does not exist, expired,
    /// or failed structural validation.
    #[error("session is invalid or expired")]
    InvalidSession,

    /// Strict-mode session binding check failed: both device fingerprint and
    /// client IP differ from the values captured at session creation.
    #[error("session binding violation")]
    SessionBindingViolation,

    /// A required partner header is absent or blank.
    #[error("missing required header '{header}'")]
    MissingHeader { header: String },

    /// A partner header carried a value outside the recognized enum.
    #[error("invalid value '{value}' for header '{header}'")]
    InvalidEnumValue { header: String, value: String },

    /// The asserting identity provider does not vouch for the claimed persona.
    #[error("identity provider '{provider}' does not authorize persona '{persona}'")]
    IdpPersonaMismatch { provider: String, persona: Persona },

    /// The credential resolved fine but its auth type is not permitted for
    /// this route's classification.
    #[error("auth type '{auth_type}' is not allowed on this route")]
    AuthTypeNotAllowed { auth_type: AuthType },

    /// The persona is outside the endpoint's allowed set, or a delegate
    /// requested a target outside their authorized scope.
    #[error("persona '{actual}' is not authorized (requires one of {required:?})")]
    PersonaNotAuthorized {
        actual: Persona,
        required: Vec<Persona>,
    },

    /// A delegate lacks some of the delegate types the endpoint requires.
    #[error("missing delegate types {missing:?}")]
    MissingDelegateTypes { missing: BTreeSet<DelegateType> },

    /// A self-service request asserted a target identity different from the
    /// authenticated one. Distinct from an ordinary denial: both ids are
    /// reported for alerting.
    #[error("client-asserted target '{attempted_enterprise_id}' differs from authenticated identity")]
    SecurityIncident {
        logged_in_member_id: String,
        attempted_enterprise_id: String,
    },

    /// The authoritative ABAC policy (or the default-deny fallback) denied
    /// the operation.
    #[error("denied by policy {policy_id:?}: {reason}")]
    PolicyDenied {
        policy_id: Option<String>,
        reason: String,
    },

    /// An external dependency failed or timed out. Always fail-closed.
    #[error("dependency '{dependency}' unavailable (timed_out={timed_out})")]
    DependencyUnavailable { dependency: String, timed_out: bool },

    /// Client input could not be parsed into the expected shape.
    #[error("malformed input: {message}")]
    MalformedInput { message: String },

    /// The requested resource does not exist.
    #[error("resource not found")]
    NotFound,
}

impl AuthError {
    /// Stable machine-readable code surfaced in the client body.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredential => "MISSING_CREDENTIAL",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InvalidSession => "INVALID_SESSION",
            Self::SessionBindingViolation => "SESSION_BINDING_VIOLATION",
            Self::MissingHeader { .. } => "MISSING_HEADER",
            Self::InvalidEnumValue { .. } => "INVALID_ENUM_VALUE",
            Self::IdpPersonaMismatch { .. } => "IDP_PERSONA_MISMATCH",
            Self::AuthTypeNotAllowed { .. } => "AUTH_TYPE_NOT_ALLOWED",
            Self::PersonaNotAuthorized { .. } => "PERSONA_NOT_AUTHORIZED",
            Self::MissingDelegateTypes { .. } => "MISSING_DELEGATE_TYPES",
            Self::SecurityIncident { .. } => "SECURITY_INCIDENT",
            Self::PolicyDenied { .. } => "POLICY_DENIED",
            Self::DependencyUnavailable { .. } => "DEPENDENCY_UNAVAILABLE",
            Self::MalformedInput { .. } => "MALFORMED_INPUT",
            Self::NotFound => "NOT_FOUND",
        }
    }

    /// HTTP status for the boundary translator.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingCredential
            | Self::InvalidCredentials
            | Self::InvalidSession
            | Self::SessionBindingViolation
            | Self::MissingHeader { .. }
            | Self::InvalidEnumValue { .. }
            | Self::AuthTypeNotAllowed { .. } => StatusCode::UNAUTHORIZED,
            Self::IdpPersonaMismatch { .. }
            | Self::PersonaNotAuthorized { .. }
            | Self::MissingDelegateTypes { .. }
            | Self::SecurityIncident { .. }
            | Self::PolicyDenied { .. } => StatusCode::FORBIDDEN,
            Self::DependencyUnavailable { timed_out, .. } => {
                if *timed_out {
                    StatusCode::GATEWAY_TIMEOUT
                } else {
                    StatusCode::BAD_GATEWAY
                }
            }
            Self::MalformedInput { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }

    /// Whether a 401 on this error should instruct the browser to clear the
    /// session cookie.
    #[must_use]
    pub fn clears_session_cookie(&self) -> bool {
        matches!(
            self,
            Self::InvalidSession | Self::SessionBindingViolation
        )
    }

    /// Generic, length-bounded message for the client body. Internal detail
    /// (raw policy reasons, identifiers beyond the documented ones) never
    /// appears here.
    #[must_use]
    pub fn client_message(&self) -> &'static str {
        match self {
            Self::MissingCredential => "Authentication is required",
            Self::InvalidCredentials => "The provided credentials are invalid",
            Self::InvalidSession => "Your session is no longer valid",
            Self::SessionBindingViolation => "Your session could not be verified",
            Self::MissingHeader { .. } => "A required header is missing",
            Self::InvalidEnumValue { .. } => "A header carried an unrecognized value",
            Self::IdpPersonaMismatch { .. } => "The asserted persona is not authorized",
            Self::AuthTypeNotAllowed { .. } => "This credential type is not accepted here",
            Self::PersonaNotAuthorized { .. } | Self::SecurityIncident { .. } => {
                "You are not authorized for this operation"
            }
            Self::MissingDelegateTypes { .. } => "Additional delegate permissions are required",
            Self::PolicyDenied { .. } => "Access to this resource is denied",
            Self::DependencyUnavailable { .. } => "A required service is unavailable",
            Self::MalformedInput { .. } => "The request could not be understood",
            Self::NotFound => "The requested resource was not found",
        }
    }

    /// Documented, client-safe details. Anything not listed here stays in
    /// server-side logs only.
    #[must_use]
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::MissingHeader { header } => Some(serde_json::json!({ "header": header })),
            Self::InvalidEnumValue { header, value } => Some(serde_json::json!({
                "header": header,
                "value": crate::response::sanitize_reason(value, 64),
            })),
            Self::IdpPersonaMismatch { provider, persona } => Some(serde_json::json!({
                "provider": provider,
                "persona": persona,
            })),
            Self::AuthTypeNotAllowed { auth_type } => {
                Some(serde_json::json!({ "authType": auth_type }))
            }
            Self::PersonaNotAuthorized { actual, required } => Some(serde_json::json!({
                "actual": actual,
                "required": required,
            })),
            Self::MissingDelegateTypes { missing } => {
                Some(serde_json::json!({ "missing": missing }))
            }
            Self::PolicyDenied { policy_id, reason } => Some(serde_json::json!({
                "policyId": policy_id,
                "reason": crate::response::sanitize_reason(reason, 120),
            })),
            Self::MissingCredential
            | Self::InvalidCredentials
            | Self::InvalidSession
            | Self::SessionBindingViolation
            | Self::SecurityIncident { .. }
            | Self::DependencyUnavailable { .. }
            | Self::MalformedInput { .. }
            | Self::NotFound => None,
        }
    }

    /// Server-side log event for this error. Security incidents are logged at
    /// elevated severity with both identifiers so alerting can fire; plain
    /// authentication failures stay at debug.
    pub fn log(&self, path: &str, correlation_id: uuid::Uuid) {
        match self {
            Self::SecurityIncident {
                logged_in_member_id,
                attempted_enterprise_id,
            } => {
                tracing::error!(
                    event = "security.incident",
                    %correlation_id,
                    path,
                    logged_in_member_id,
                    attempted_enterprise_id,
                    "client-asserted target differs from authenticated identity"
                );
            }
            Self::PolicyDenied { policy_id, reason } => {
                tracing::warn!(
                    event = "authz.policy_denied",
                    %correlation_id,
                    path,
                    policy_id = policy_id.as_deref().unwrap_or("-"),
                    reason,
                    "policy denied request"
                );
            }
            Self::PersonaNotAuthorized { .. }
            | Self::MissingDelegateTypes { .. }
            | Self::IdpPersonaMismatch { .. } => {
                tracing::warn!(event = "authz.denied", %correlation_id, path, error = %self, "authorization denied");
            }
            Self::DependencyUnavailable { dependency, timed_out } => {
                tracing::error!(
                    event = "dependency.unavailable",
                    %correlation_id,
                    path,
                    dependency,
                    timed_out,
                    "failing closed on unavailable dependency"
                );
            }
            _ => {
                tracing::debug!(event = "authn.failed", %correlation_id, path, error = %self, "authentication failed");
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_the_contract() {
        assert_eq!(AuthError::MissingCredential.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::InvalidSession.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::AuthTypeNotAllowed { auth_type: AuthType::Proxy }.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::PersonaNotAuthorized {
                actual: Persona::Agent,
                required: vec![Persona::SelfService],
            }
            .status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::DependencyUnavailable { dependency: "session-store".to_owned(), timed_out: true }
                .status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            AuthError::DependencyUnavailable { dependency: "session-store".to_owned(), timed_out: false }
                .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AuthError::MalformedInput { message: "bad json".to_owned() }.status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn only_session_errors_clear_the_cookie() {
        assert!(AuthError::InvalidSession.clears_session_cookie());
        assert!(AuthError::SessionBindingViolation.clears_session_cookie());
        assert!(!AuthError::MissingCredential.clears_session_cookie());
        assert!(!AuthError::NotFound.clears_session_cookie());
    }

    #[test]
    fn missing_delegate_types_detail_names_the_gap() {
        let err = AuthError::MissingDelegateTypes {
            missing: [DelegateType::Roi].into_iter().collect(),
        };
        let details = err.details().unwrap();
        assert_eq!(details["missing"], serde_json::json!(["ROI"]));
    }

    #[test]
    fn security_incident_exposes_no_details_to_clients() {
        let err = AuthError::SecurityIncident {
            logged_in_member_id: "user-123".to_owned(),
            attempted_enterprise_id: "ENT-999".to_owned(),
        };
        assert!(err.details().is_none());
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }
}
