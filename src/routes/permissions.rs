use actix_web::{get, post, web, HttpResponse, Responder};
use sqlx::SqlitePool;
use tracing::instrument;
use validator::Validate;

use crate::{
    core::{session_auth::Identity, AppError, AppSuccessResponse},
    db::{access, submissions},
    models::access::{RevokeAccessPayload, RevokeAccessResponse},
};

#[instrument(name = "List Access Grants", skip(pool))]
#[get("/grants/{submission_id}")]
pub async fn list_access_grants(
    pool: web::Data<SqlitePool>,
    identity: Identity,
    submission_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let owner_email = identity.require_factory()?;
    let submission_id = submission_id.into_inner();

    match submissions::fetch_submission(pool.get_ref(), &submission_id).await? {
        Some(submission) if submission.owner_email == owner_email => {}
        _ => return Err(AppError::not_found()),
    }

    let grants = access::aggregate_grants(pool.get_ref(), &submission_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        message: "Access grants retrieved successfully".to_string(),
        data: Some(grants),
        pagination: None,
    }))
}

#[instrument(name = "Revoke Access Grant", skip(pool, payload))]
#[post("/grants/revoke")]
pub async fn revoke_access(
    pool: web::Data<SqlitePool>,
    identity: Identity,
    payload: web::Json<RevokeAccessPayload>,
) -> Result<impl Responder, AppError> {
    let payload = payload.into_inner();
    payload
        .validate()
        .map_err(|e| AppError::validation_error(e.to_string().replace('\n', "; ")))?;

    let owner_email = identity.require_factory()?;

    match submissions::fetch_submission(pool.get_ref(), &payload.submission_id).await? {
        Some(submission) if submission.owner_email == owner_email => {}
        _ => return Err(AppError::not_found()),
    }

    let revoked = access::revoke_grants(
        pool.get_ref(),
        &payload.submission_id,
        &payload.entrepreneur_email,
    )
    .await?;

    let message = if revoked {
        "Access revoked successfully"
    } else {
        "No active grants for this entrepreneur"
    };

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        message: message.to_string(),
        data: Some(RevokeAccessResponse { revoked }),
        pagination: None,
    }))
}
