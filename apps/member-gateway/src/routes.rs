//! The route security registry.
//!
//! Every route the gateway serves is registered here with its credential
//! class, endpoint requirement, and where a delegate target travels. The
//! table is explicit data built at startup, so the full security posture of
//! the router is auditable in one place; a request whose path is not in the
//! table never reaches a handler.

use std::collections::HashMap;
use std::sync::Arc;

use authn_resolver::RouteClass;
use authz_resolver::EndpointRequirement;
use gateway_security::Persona;
use http::Method;

/// Where the client-asserted target member id travels for this route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetSource {
    /// No target on this route.
    #[default]
    None,
    /// `memberId` query parameter, resolved by the middleware.
    Query,
    /// Validated field of the request body, resolved by the handler after
    /// parsing.
    Body,
}

/// Security metadata for one method on one route pattern.
#[derive(Debug, Clone)]
pub struct RouteSecurity {
    pub class: RouteClass,
    /// Absent only on public routes.
    pub requirement: Option<EndpointRequirement>,
    pub target_source: TargetSource,
}

impl RouteSecurity {
    #[must_use]
    pub fn public() -> Self {
        Self {
            class: RouteClass::Public,
            requirement: None,
            target_source: TargetSource::None,
        }
    }

    #[must_use]
    pub fn protected(class: RouteClass, requirement: EndpointRequirement) -> Self {
        Self {
            class,
            requirement: Some(requirement),
            target_source: TargetSource::None,
        }
    }

    #[must_use]
    pub fn with_target(mut self, source: TargetSource) -> Self {
        self.target_source = source;
        self
    }
}

/// Pattern-matched lookup from method + path to [`RouteSecurity`].
pub struct SecurityRegistry {
    router: matchit::Router<HashMap<Method, Arc<RouteSecurity>>>,
}

impl SecurityRegistry {
    #[must_use]
    pub fn builder() -> SecurityRegistryBuilder {
        SecurityRegistryBuilder::default()
    }

    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> Option<Arc<RouteSecurity>> {
        self.router
            .at(path)
            .ok()
            .and_then(|m| m.value.get(method).cloned())
    }
}

#[derive(Default)]
pub struct SecurityRegistryBuilder {
    entries: Vec<(Method, String, RouteSecurity)>,
}

impl SecurityRegistryBuilder {
    #[must_use]
    pub fn route(mut self, method: Method, pattern: &str, security: RouteSecurity) -> Self {
        self.entries.push((method, pattern.to_owned(), security));
        self
    }

    /// Freeze the table.
    ///
    /// # Errors
    ///
    /// Fails on conflicting patterns or a method registered twice for the
    /// same pattern.
    pub fn build(self) -> anyhow::Result<SecurityRegistry> {
        let mut per_path: HashMap<String, HashMap<Method, Arc<RouteSecurity>>> = HashMap::new();
        for (method, pattern, security) in self.entries {
            let methods = per_path.entry(pattern.clone()).or_default();
            if methods.insert(method.clone(), Arc::new(security)).is_some() {
                anyhow::bail!("duplicate security registration for {method} {pattern}");
            }
        }
        let mut router = matchit::Router::new();
        for (pattern, methods) in per_path {
            router.insert(pattern, methods)?;
        }
        Ok(SecurityRegistry { router })
    }
}

/// The gateway's route table.
pub fn default_registry() -> anyhow::Result<SecurityRegistry> {
    let session_personas = [Persona::SelfService, Persona::Delegate];
    let document_readers = [
        Persona::SelfService,
        Persona::Delegate,
        Persona::Agent,
        Persona::CaseWorker,
        Persona::ConfigSpecialist,
    ];
    let document_writers = [Persona::SelfService, Persona::Delegate, Persona::CaseWorker];

    SecurityRegistry::builder()
        .route(Method::GET, "/healthz", RouteSecurity::public())
        .route(Method::POST, "/auth/v1/login", RouteSecurity::public())
        .route(
            Method::POST,
            "/auth/v1/logout",
            RouteSecurity::protected(
                RouteClass::SessionOnly,
                EndpointRequirement::allowing(session_personas),
            ),
        )
        .route(
            Method::GET,
            "/documents/v1/documents/{id}",
            RouteSecurity::protected(
                RouteClass::Dual,
                EndpointRequirement::allowing(document_readers).with_resource_type("document"),
            )
            .with_target(TargetSource::Query),
        )
        .route(
            Method::PUT,
            "/documents/v1/documents/{id}",
            RouteSecurity::protected(
                RouteClass::Dual,
                EndpointRequirement::allowing(document_writers).with_resource_type("document"),
            )
            .with_target(TargetSource::Body),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_matches_patterns_per_method() {
        let registry = default_registry().unwrap();
        let get = registry
            .lookup(&Method::GET, "/documents/v1/documents/doc-1")
            .unwrap();
        assert_eq!(get.class, RouteClass::Dual);
        assert_eq!(get.target_source, TargetSource::Query);

        let put = registry
            .lookup(&Method::PUT, "/documents/v1/documents/doc-1")
            .unwrap();
        assert_eq!(put.target_source, TargetSource::Body);

        assert!(registry.lookup(&Method::DELETE, "/documents/v1/documents/doc-1").is_none());
        assert!(registry.lookup(&Method::GET, "/unregistered").is_none());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let result = SecurityRegistry::builder()
            .route(Method::GET, "/healthz", RouteSecurity::public())
            .route(Method::GET, "/healthz", RouteSecurity::public())
            .build();
        assert!(result.is_err());
    }
}
