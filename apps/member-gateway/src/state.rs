//! Shared application state, assembled once at startup.

use std::sync::Arc;
use std::time::Duration;

use authn_resolver::{ClientInfoExtractor, DualAuthResolver};
use authz_resolver::{
    InMemoryPermissionsSource, PersonaAuthorizationGate, PolicyEngine, builtin_policy_set,
};
use chrono::{DateTime, Utc};
use session_store::{SessionStore, build_store};

use crate::config::AppConfig;
use crate::documents::DocumentRepo;
use crate::identity::IdentityDirectory;
use crate::routes::{SecurityRegistry, default_registry};

/// How session cookies are issued and cleared.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,
    pub ttl: Duration,
    pub secure: bool,
}

impl CookieSettings {
    #[must_use]
    pub fn issue(&self, session_id: &str) -> String {
        let mut cookie = format!(
            "{}={session_id}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}",
            self.name,
            self.ttl.as_secs()
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// Instructs the browser to drop the cookie immediately.
    #[must_use]
    pub fn clear(&self) -> String {
        let mut cookie = format!("{}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0", self.name);
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<DualAuthResolver>,
    pub gate: Arc<PersonaAuthorizationGate>,
    pub engine: Arc<PolicyEngine>,
    pub store: Arc<dyn SessionStore>,
    pub registry: Arc<SecurityRegistry>,
    pub documents: Arc<DocumentRepo>,
    pub identities: Arc<IdentityDirectory>,
    pub client_info: Arc<ClientInfoExtractor>,
    pub cookies: CookieSettings,
    pub store_timeout: Duration,
}

/// Wire every collaborator from configuration.
///
/// # Errors
///
/// Fails when the session backend cannot be reached or the route table is
/// internally inconsistent.
pub async fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let store = build_store(&config.session_store).await?;

    let mut permissions = InMemoryPermissionsSource::new();
    for seed in &config.delegate_assignments {
        permissions = permissions.with_assignment(authz_resolver::DelegateAssignment {
            delegate_user_id: seed.delegate_user_id.clone(),
            target_enterprise_id: seed.target_enterprise_id.clone(),
            delegate_types: seed.delegate_types.iter().copied().collect(),
            effective_from: seed.effective_from.unwrap_or(DateTime::<Utc>::MIN_UTC),
            effective_until: seed.effective_until,
        });
    }

    let engine = PolicyEngine::builder()
        .register_all(builtin_policy_set(
            config.authz.config_specialist_denied_resource_types.clone(),
        ))
        .build();

    Ok(AppState {
        resolver: Arc::new(DualAuthResolver::new(store.clone(), config.authn.clone())),
        gate: Arc::new(PersonaAuthorizationGate::new(
            Arc::new(permissions),
            config.authz.clone(),
        )),
        engine: Arc::new(engine),
        store,
        registry: Arc::new(default_registry()?),
        documents: Arc::new(DocumentRepo::from_seeds(config.documents.clone())),
        identities: Arc::new(IdentityDirectory::new(
            config.identities.clone(),
            config.delegate_assignments.clone(),
        )),
        client_info: Arc::new(ClientInfoExtractor::new(config.authn.trusted_proxies.clone())),
        cookies: CookieSettings {
            name: config.authn.cookie_name.clone(),
            ttl: config.authn.session_ttl(),
            secure: config.server.cookie_secure,
        },
        store_timeout: config.authn.store_timeout(),
    })
}
