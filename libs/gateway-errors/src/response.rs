//! Boundary translation from [`AuthError`] to the uniform client error body.
//!
//! The body shape is identical for every failure:
//! `{error, code, message, correlationId, timestamp, path, details?}`.

use axum::Json;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AuthError;

/// Uniform client-facing error payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Reason-phrase of the HTTP status (e.g. `Unauthorized`).
    pub error: String,
    /// Stable machine-readable code from the taxonomy.
    pub code: &'static str,
    /// Generic, length-bounded human message.
    pub message: &'static str,
    pub correlation_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Strip newlines and bound the length of a reason before it can reach a
/// client-facing header or body. Full reasons stay in server logs.
#[must_use]
pub fn sanitize_reason(reason: &str, max_len: usize) -> String {
    let flat: String = reason
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    let mut out: String = flat.chars().take(max_len).collect();
    if flat.chars().count() > max_len {
        out.push('…');
    }
    out
}

impl AuthError {
    /// Translate into the HTTP response, logging full detail server-side.
    ///
    /// This is the only place in the workspace that renders the taxonomy into
    /// a response; validators and gates never format their own.
    #[must_use]
    pub fn into_response_with(self, path: &str, correlation_id: Uuid) -> Response {
        self.log(path, correlation_id);
        let status = self.status();
        let body = ErrorBody {
            error: status
                .canonical_reason()
                .unwrap_or("Error")
                .to_owned(),
            code: self.code(),
            message: self.client_message(),
            correlation_id,
            timestamp: Utc::now(),
            path: path.to_owned(),
            details: self.details(),
        };
        (status, Json(body)).into_response()
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // Fallback path for extractor/handler use where the middleware did
        // not supply request metadata.
        self.into_response_with("-", Uuid::new_v4())
    }
}
