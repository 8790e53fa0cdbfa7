//! Session lifecycle: login issues the cookie, logout removes the session
//! and clears it.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::Utc;
use gateway_errors::AuthError;
use gateway_security::{Auth, Persona};
use http::HeaderMap;
use http::header::SET_COOKIE;
use serde::{Deserialize, Serialize};
use session_store::{SessionRecord, new_session_id};
use uuid::Uuid;

use crate::middleware::PeerAddr;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_id: String,
    pub enterprise_id: String,
    pub persona: Persona,
}

/// Verify credentials against the identity source, create the session, and
/// hand the browser its cookie. Client signals (IP, device fingerprint) are
/// captured here and bind the session for its lifetime.
#[allow(clippy::needless_pass_by_value)] // axum extractors are taken by value
pub async fn login(
    State(state): State<AppState>,
    Extension(PeerAddr(peer)): Extension<PeerAddr>,
    headers: HeaderMap,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, AuthError> {
    let Json(body) = body.map_err(|e| AuthError::MalformedInput {
        message: e.body_text(),
    })?;
    let identity = state
        .identities
        .verify(&body.username, &body.password)
        .ok_or(AuthError::InvalidCredentials)?;

    let client = state.client_info.extract(&headers, peer);
    let now = Utc::now();
    let record = SessionRecord {
        session_id: new_session_id(),
        user_id: identity.user_id.clone(),
        enterprise_id: identity.enterprise_id.clone(),
        persona: identity.persona,
        delegate_grants: identity.delegate_grants,
        client_ip: client.ip,
        device_fingerprint: client.device_fingerprint,
        token_material: format!("idp-token:{}", Uuid::new_v4()),
        created_at: now,
        last_accessed_at: now,
    };
    let session_id = record.session_id.clone();

    let put = state.store.put(record, state.cookies.ttl);
    match tokio::time::timeout(state.store_timeout, put).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::error!(error = %e, "failed to persist new session");
            return Err(AuthError::DependencyUnavailable {
                dependency: "session-store".to_owned(),
                timed_out: false,
            });
        }
        Err(_) => {
            return Err(AuthError::DependencyUnavailable {
                dependency: "session-store".to_owned(),
                timed_out: true,
            });
        }
    }

    tracing::info!(
        event = "session.created",
        user_id = %identity.user_id,
        persona = %identity.persona,
        "login succeeded"
    );

    let mut response = Json(LoginResponse {
        user_id: identity.user_id,
        enterprise_id: identity.enterprise_id,
        persona: identity.persona,
    })
    .into_response();
    append_cookie(&mut response, &state.cookies.issue(&session_id));
    Ok(response)
}

/// Remove the server-side session and clear the browser cookie. Best-effort
/// on the store side: the cookie is cleared even if the backend hiccups.
#[allow(clippy::needless_pass_by_value)] // axum extractors are taken by value
pub async fn logout(State(state): State<AppState>, Auth(ctx): Auth) -> Response {
    if let Some(session_id) = ctx.session_id() {
        let delete = state.store.delete(session_id);
        match tokio::time::timeout(state.store_timeout, delete).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "session delete failed during logout"),
            Err(_) => tracing::warn!("session delete timed out during logout"),
        }
    }
    tracing::info!(event = "session.ended", user_id = %ctx.user_id(), "logout");

    let mut response = http::StatusCode::NO_CONTENT.into_response();
    append_cookie(&mut response, &state.cookies.clear());
    response
}

fn append_cookie(response: &mut Response, cookie: &str) {
    if let Ok(value) = http::HeaderValue::from_str(cookie) {
        response.headers_mut().append(SET_COOKIE, value);
    };
}
