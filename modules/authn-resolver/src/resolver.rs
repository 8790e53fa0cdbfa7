//! The dual-auth resolver: credential detection, validation, and
//! `AuthContext` construction.

use std::net::IpAddr;
use std::sync::Arc;

use chrono::Utc;
use gateway_errors::AuthError;
use gateway_security::{AuthContext, AuthType, Persona};
use http::HeaderMap;
use session_store::{SessionRecord, SessionStore, StoreError};

use crate::binding::SessionBindingValidator;
use crate::client_info::ClientInfoExtractor;
use crate::config::AuthnConfig;
use crate::partner::PartnerHeaderAuthenticator;

/// Which credential types a route accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteClass {
    /// Anonymous access allowed; credentials are resolved when present.
    Public,
    SessionOnly,
    ProxyOnly,
    /// Either credential type.
    Dual,
}

impl RouteClass {
    #[must_use]
    pub fn permits(self, auth_type: AuthType) -> bool {
        match self {
            Self::Public | Self::Dual => true,
            Self::SessionOnly => auth_type == AuthType::Session,
            Self::ProxyOnly => auth_type == AuthType::Proxy,
        }
    }
}

/// Resolves one [`AuthContext`] per request, or fails closed.
///
/// The only side effect is the session-store read plus the sliding-TTL
/// `touch` on a validated session access.
pub struct DualAuthResolver {
    store: Arc<dyn SessionStore>,
    config: AuthnConfig,
    binding: SessionBindingValidator,
    partner: PartnerHeaderAuthenticator,
    client_info: ClientInfoExtractor,
}

impl DualAuthResolver {
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, config: AuthnConfig) -> Self {
        let binding = SessionBindingValidator::new(config.binding.clone());
        let client_info = ClientInfoExtractor::new(config.trusted_proxies.clone());
        Self {
            store,
            config,
            binding,
            partner: PartnerHeaderAuthenticator::new(),
            client_info,
        }
    }

    /// Resolve the request's identity.
    ///
    /// Returns `Ok(None)` only for public routes with no credential at all.
    /// A session cookie takes precedence when both credential types are
    /// somehow present; partner headers on a browser request are not a
    /// combination the mTLS edge produces.
    ///
    /// # Errors
    ///
    /// Typed [`AuthError`] for every failure mode; resolution never falls
    /// through to an implicit allow.
    #[tracing::instrument(skip_all, fields(route_class = ?class))]
    pub async fn resolve(
        &self,
        headers: &HeaderMap,
        peer: Option<IpAddr>,
        class: RouteClass,
    ) -> Result<Option<AuthContext>, AuthError> {
        if let Some(session_id) = session_cookie(headers, &self.config.cookie_name) {
            if !class.permits(AuthType::Session) {
                return Err(AuthError::AuthTypeNotAllowed {
                    auth_type: AuthType::Session,
                });
            }
            return self.resolve_session(&session_id, headers, peer).await.map(Some);
        }

        if PartnerHeaderAuthenticator::is_partner_request(headers) {
            if !class.permits(AuthType::Proxy) {
                return Err(AuthError::AuthTypeNotAllowed {
                    auth_type: AuthType::Proxy,
                });
            }
            return self.partner.authenticate(headers).map(Some);
        }

        match class {
            RouteClass::Public => Ok(None),
            RouteClass::SessionOnly | RouteClass::ProxyOnly | RouteClass::Dual => {
                Err(AuthError::MissingCredential)
            }
        }
    }

    async fn resolve_session(
        &self,
        session_id: &str,
        headers: &HeaderMap,
        peer: Option<IpAddr>,
    ) -> Result<AuthContext, AuthError> {
        let record = self
            .store_call(self.store.get(session_id))
            .await?
            .ok_or(AuthError::InvalidSession)?;

        let client = self.client_info.extract(headers, peer);
        self.binding.validate(&record, &client)?;

        // Validated access: slide the TTL. Idempotent, so a concurrent
        // request touching the same session is harmless.
        self.store_call(self.store.touch(session_id, self.config.session_ttl()))
            .await?;

        build_session_context(&record)
    }

    async fn store_call<T>(
        &self,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, AuthError> {
        match tokio::time::timeout(self.config.store_timeout(), fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "session store call failed");
                Err(AuthError::DependencyUnavailable {
                    dependency: "session-store".to_owned(),
                    timed_out: false,
                })
            }
            Err(_) => Err(AuthError::DependencyUnavailable {
                dependency: "session-store".to_owned(),
                timed_out: true,
            }),
        }
    }
}

fn build_session_context(record: &SessionRecord) -> Result<AuthContext, AuthError> {
    let mut builder = AuthContext::builder()
        .auth_type(AuthType::Session)
        .user_id(record.user_id.clone())
        .effective_member_id(record.enterprise_id.clone())
        .persona(record.persona)
        .session_id(record.session_id.clone());
    if record.persona == Persona::Delegate {
        builder = builder.delegate_types(record.active_delegate_types(Utc::now()));
    }
    builder.build().map_err(|e| {
        tracing::error!(error = %e, session_id = %record.session_id, "stored session record is structurally invalid");
        AuthError::InvalidSession
    })
}

/// Pull the session cookie value out of the `Cookie` header(s).
fn session_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(http::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.to_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use session_store::{MemorySessionStore, new_session_id};

    fn config() -> AuthnConfig {
        AuthnConfig::default()
    }

    async fn seeded_resolver(record: SessionRecord) -> DualAuthResolver {
        let store = Arc::new(MemorySessionStore::new());
        store
            .put(record, std::time::Duration::from_secs(60))
            .await
            .unwrap();
        DualAuthResolver::new(store, config())
    }

    fn session_record(fp: Option<&str>) -> SessionRecord {
        let now = Utc::now();
        SessionRecord {
            session_id: new_session_id(),
            user_id: "user-123".to_owned(),
            enterprise_id: "ENT-001".to_owned(),
            persona: Persona::SelfService,
            delegate_grants: vec![],
            client_ip: Some("203.0.113.1".parse().unwrap()),
            device_fingerprint: fp.map(str::to_owned),
            token_material: "opaque".to_owned(),
            created_at: now,
            last_accessed_at: now,
        }
    }

    fn cookie_headers(cookie_name: &str, session_id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::COOKIE,
            HeaderValue::from_str(&format!("{cookie_name}={session_id}; theme=dark")).unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn valid_session_resolves_to_session_context() {
        let mut record = session_record(None);
        record.client_ip = None;
        record.device_fingerprint = Some("anything".to_owned());
        // Disable binding for this structural test.
        let store = Arc::new(MemorySessionStore::new());
        store
            .put(record.clone(), std::time::Duration::from_secs(60))
            .await
            .unwrap();
        let mut cfg = config();
        cfg.binding.enabled = false;
        let resolver = DualAuthResolver::new(store, cfg);

        let headers = cookie_headers("BFF_SESSION", &record.session_id);
        let ctx = resolver
            .resolve(&headers, None, RouteClass::SessionOnly)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ctx.auth_type(), AuthType::Session);
        assert_eq!(ctx.user_id(), "user-123");
        assert_eq!(ctx.effective_member_id(), "ENT-001");
        assert_eq!(ctx.session_id(), Some(record.session_id.as_str()));
    }

    #[tokio::test]
    async fn resolving_twice_is_idempotent() {
        let mut record = session_record(None);
        record.client_ip = None;
        let store = Arc::new(MemorySessionStore::new());
        store
            .put(record.clone(), std::time::Duration::from_secs(60))
            .await
            .unwrap();
        let mut cfg = config();
        cfg.binding.enabled = false;
        let resolver = DualAuthResolver::new(store, cfg);
        let headers = cookie_headers("BFF_SESSION", &record.session_id);

        let first = resolver
            .resolve(&headers, None, RouteClass::Dual)
            .await
            .unwrap()
            .unwrap();
        let second = resolver
            .resolve(&headers, None, RouteClass::Dual)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn unknown_session_id_is_invalid_session() {
        let resolver = seeded_resolver(session_record(None)).await;
        let headers = cookie_headers("BFF_SESSION", "not-a-real-session");
        let err = resolver
            .resolve(&headers, None, RouteClass::SessionOnly)
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidSession);
    }

    #[tokio::test]
    async fn session_on_proxy_only_route_is_auth_type_not_allowed() {
        let record = session_record(None);
        let session_id = record.session_id.clone();
        let resolver = seeded_resolver(record).await;
        let headers = cookie_headers("BFF_SESSION", &session_id);
        let err = resolver
            .resolve(&headers, None, RouteClass::ProxyOnly)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AuthError::AuthTypeNotAllowed {
                auth_type: AuthType::Session
            }
        );
    }

    #[tokio::test]
    async fn partner_headers_on_session_only_route_rejected() {
        let resolver = seeded_resolver(session_record(None)).await;
        let mut headers = HeaderMap::new();
        headers.insert("x-persona", HeaderValue::from_static("case_worker"));
        headers.insert("x-member-id", HeaderValue::from_static("member-42"));
        headers.insert("x-member-id-type", HeaderValue::from_static("OHID"));
        let err = resolver
            .resolve(&headers, None, RouteClass::SessionOnly)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AuthError::AuthTypeNotAllowed {
                auth_type: AuthType::Proxy
            }
        );
    }

    #[tokio::test]
    async fn no_credential_on_protected_route_is_missing_credential() {
        let resolver = seeded_resolver(session_record(None)).await;
        let err = resolver
            .resolve(&HeaderMap::new(), None, RouteClass::Dual)
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::MissingCredential);
    }

    #[tokio::test]
    async fn public_route_without_credentials_resolves_to_anonymous() {
        let resolver = seeded_resolver(session_record(None)).await;
        let ctx = resolver
            .resolve(&HeaderMap::new(), None, RouteClass::Public)
            .await
            .unwrap();
        assert!(ctx.is_none());
    }

    #[tokio::test]
    async fn partner_resolution_works_on_dual_route() {
        let resolver = seeded_resolver(session_record(None)).await;
        let mut headers = HeaderMap::new();
        headers.insert("x-persona", HeaderValue::from_static("Case-Worker"));
        headers.insert("x-member-id", HeaderValue::from_static("member-42"));
        headers.insert("x-member-id-type", HeaderValue::from_static("ohid"));
        let ctx = resolver
            .resolve(&headers, None, RouteClass::Dual)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ctx.auth_type(), AuthType::Proxy);
        assert_eq!(ctx.persona(), Persona::CaseWorker);
    }

    #[tokio::test]
    async fn binding_violation_propagates_in_strict_mode() {
        let record = session_record(Some("stored-fp"));
        let session_id = record.session_id.clone();
        let resolver = seeded_resolver(record).await;
        // Cookie from a different device on a different network: the request
        // has a user-agent (so a fingerprint is computed) but neither signal
        // matches the stored ones.
        let mut headers = cookie_headers("BFF_SESSION", &session_id);
        headers.insert("user-agent", HeaderValue::from_static("OtherBrowser/2.0"));
        let err = resolver
            .resolve(
                &headers,
                Some("198.51.100.77".parse().unwrap()),
                RouteClass::SessionOnly,
            )
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::SessionBindingViolation);
    }
}
