//! Document endpoints demonstrating resource-level policy evaluation.
//!
//! The middleware has already authenticated the caller and run the persona
//! gate; these handlers fetch the concrete resource and let the policy
//! engine produce the authoritative decision against its attributes.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::{Extension, Json};
use gateway_errors::AuthError;
use gateway_security::{Action, Auth};
use serde::Deserialize;

use crate::documents::Document;
use crate::middleware::RouteSecurityExt;
use crate::state::AppState;

#[allow(clippy::needless_pass_by_value)] // axum extractors are taken by value
pub async fn get_document(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Path(id): Path<String>,
) -> Result<Json<Document>, AuthError> {
    let document = state.documents.get(&id).ok_or(AuthError::NotFound)?;
    let subject = ctx.subject_attributes();
    state
        .engine
        .authorize(&authz_resolver::PolicyRequest {
            subject: &subject,
            resource: &document.attributes,
            action: Action::Read,
        })
        .await?;
    Ok(Json(document))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateDocumentRequest {
    /// Target member id for delegate writes; travels in the validated body
    /// rather than the query string.
    #[serde(default)]
    pub member_id: Option<String>,
    pub title: String,
    pub content: String,
}

#[allow(clippy::needless_pass_by_value)] // axum extractors are taken by value
pub async fn update_document(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Extension(security): Extension<RouteSecurityExt>,
    Path(id): Path<String>,
    body: Result<Json<UpdateDocumentRequest>, JsonRejection>,
) -> Result<Json<Document>, AuthError> {
    let Json(body) = body.map_err(|e| AuthError::MalformedInput {
        message: e.body_text(),
    })?;

    // Finish target resolution with the body-carried target; the middleware
    // only ran the synchronous checks for this route.
    let ctx = match &security.requirement {
        Some(requirement) => {
            state
                .gate
                .authorize(&ctx, requirement, body.member_id.as_deref())
                .await?
        }
        None => ctx,
    };

    let document = state.documents.get(&id).ok_or(AuthError::NotFound)?;
    let subject = ctx.subject_attributes();
    state
        .engine
        .authorize(&authz_resolver::PolicyRequest {
            subject: &subject,
            resource: &document.attributes,
            action: Action::Write,
        })
        .await?;

    let updated = state
        .documents
        .update_content(&id, body.title, body.content)
        .ok_or(AuthError::NotFound)?;
    Ok(Json(updated))
}
