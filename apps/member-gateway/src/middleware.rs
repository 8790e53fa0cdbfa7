//! The authentication middleware.
//!
//! Runs on every request: looks up the route's security metadata, resolves
//! the credential, applies the persona gate, and stashes the resulting
//! [`AuthContext`] in request extensions for handlers. Every failure is
//! rendered here through the single boundary translator, with cookie clearing
//! on invalidated sessions.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use gateway_errors::AuthError;
use gateway_security::AuthContext;
use http::HeaderValue;
use http::header::SET_COOKIE;
use uuid::Uuid;

use crate::routes::{RouteSecurity, TargetSource};
use crate::state::{AppState, CookieSettings};

/// Connection peer address, present even on public routes so handlers can
/// capture client signals at login.
#[derive(Debug, Clone, Copy)]
pub struct PeerAddr(pub Option<IpAddr>);

#[allow(clippy::needless_pass_by_value)] // axum extractors are taken by value
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_owned();
    let method = req.method().clone();
    let correlation_id = correlation_id(&req);
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());
    req.extensions_mut().insert(PeerAddr(peer));

    let Some(security) = state.registry.lookup(&method, &path) else {
        return AuthError::NotFound.into_response_with(&path, correlation_id);
    };

    let resolved = match state
        .resolver
        .resolve(req.headers(), peer, security.class)
        .await
    {
        Ok(resolved) => resolved,
        Err(err) => return error_response(err, &path, correlation_id, &state.cookies),
    };

    if let Some(ctx) = resolved {
        let ctx = match apply_gate(&state, &security, &ctx, req.uri().query()).await {
            Ok(ctx) => ctx,
            Err(err) => return error_response(err, &path, correlation_id, &state.cookies),
        };
        req.extensions_mut().insert(ctx);
    }
    req.extensions_mut().insert(security);

    next.run(req).await
}

async fn apply_gate(
    state: &AppState,
    security: &RouteSecurity,
    ctx: &AuthContext,
    query: Option<&str>,
) -> Result<AuthContext, AuthError> {
    let Some(requirement) = &security.requirement else {
        return Ok(ctx.clone());
    };
    match security.target_source {
        TargetSource::Query => {
            let target = query_param(query, "memberId");
            state.gate.authorize(ctx, requirement, target.as_deref()).await
        }
        // Body-carried targets are resolved by the handler once the body is
        // parsed; only the synchronous checks run here.
        TargetSource::Body | TargetSource::None => {
            state.gate.screen(ctx, requirement)?;
            Ok(ctx.clone())
        }
    }
}

/// Render the error through the boundary translator, instructing the browser
/// to drop the session cookie when the session itself was the problem.
pub fn error_response(
    err: AuthError,
    path: &str,
    correlation_id: Uuid,
    cookies: &CookieSettings,
) -> Response {
    let clear_cookie = err.clears_session_cookie();
    let mut response = err.into_response_with(path, correlation_id);
    if clear_cookie
        && let Ok(value) = HeaderValue::from_str(&cookies.clear())
    {
        response.headers_mut().append(SET_COOKIE, value);
    }
    response
}

/// Correlation id from the request-id layer, or a fresh one when the layer
/// did not run.
fn correlation_id(req: &Request) -> Uuid {
    req.headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .unwrap_or_else(Uuid::new_v4)
}

/// Decoded value of `name` in the raw query string, if present and non-empty.
fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Used by handlers that finish delegate target resolution themselves.
pub type RouteSecurityExt = Arc<RouteSecurity>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_param_extraction() {
        assert_eq!(
            query_param(Some("memberId=ENT-1&x=2"), "memberId").as_deref(),
            Some("ENT-1")
        );
        assert_eq!(query_param(Some("x=2"), "memberId"), None);
        assert_eq!(query_param(Some("memberId="), "memberId"), None);
        assert_eq!(query_param(None, "memberId"), None);
    }

    #[test]
    fn query_param_decodes_percent_escapes() {
        assert_eq!(
            query_param(Some("memberId=ENT%2D001"), "memberId").as_deref(),
            Some("ENT-001")
        );
        assert_eq!(
            query_param(Some("memberId=ENT%3A001%2F42"), "memberId").as_deref(),
            Some("ENT:001/42")
        );
    }
}
