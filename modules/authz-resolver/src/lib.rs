//! Authorization resolution: the persona gate and the ABAC policy engine.
//!
//! Two layers run after authentication. The [`PersonaAuthorizationGate`]
//! enforces declarative per-endpoint requirements (allowed personas, required
//! delegate types, delegate target resolution). The [`PolicyEngine`] then
//! evaluates attribute-based policies against concrete resources, with a
//! default deny when nothing applies.

pub mod config;
pub mod gate;
pub mod permissions;
pub mod policies;
pub mod policy;
pub mod requirement;

pub use config::AuthzConfig;
pub use gate::PersonaAuthorizationGate;
pub use permissions::{
    DelegateAssignment, InMemoryPermissionsSource, PermissionsError, PermissionsSource,
};
pub use policies::builtin_policy_set;
pub use policy::{
    Decision, PolicyDecision, PolicyEngine, PolicyEngineBuilder, PolicyOutcome, PolicyRequest,
    ResourcePolicy,
};
pub use requirement::EndpointRequirement;
