//! Axum extractor for the request-scoped [`AuthContext`].
//!
//! The auth middleware inserts the resolved context into request extensions;
//! handlers take `Auth(ctx)` and never look at raw credentials. A missing
//! context means the middleware is not attached to the route — a wiring bug,
//! reported as a 500, not an authorization failure.

use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;

use crate::context::AuthContext;

/// Extractor wrapper around the resolved [`AuthContext`].
#[derive(Debug, Clone)]
pub struct Auth(pub AuthContext);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthContext>().cloned().map(Auth).ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "auth context not found - auth middleware not configured",
        ))
    }
}
