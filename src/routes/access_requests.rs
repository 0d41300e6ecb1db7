use actix_web::{get, post, web, HttpResponse, Responder};
use sqlx::SqlitePool;
use tracing::instrument;
use validator::Validate;

use crate::{
    core::{session_auth::Identity, AppError, AppSuccessResponse},
    db::{access_requests, submissions},
    models::access_requests::{
        CreateAccessRequestPayload, CreatedAccessRequest, RequestDecision, RespondToRequestPayload,
    },
};

#[instrument(name = "Create Access Request", skip(pool, payload))]
#[post("/requests")]
pub async fn create_access_request(
    pool: web::Data<SqlitePool>,
    identity: Identity,
    payload: web::Json<CreateAccessRequestPayload>,
) -> Result<impl Responder, AppError> {
    let payload = payload.into_inner();
    payload
        .validate()
        .map_err(|e| AppError::validation_error(e.to_string().replace('\n', "; ")))?;

    let (entrepreneur_email, entrepreneur_name) = identity.require_entrepreneur()?;

    let question_ids = payload.normalized_question_ids();
    if question_ids.is_empty() {
        return Err(AppError::validation_error(
            "at least one question id is required",
        ));
    }

    // Requests can only target submissions that actually exist.
    if submissions::fetch_submission(pool.get_ref(), &payload.submission_id)
        .await?
        .is_none()
    {
        return Err(AppError::not_found());
    }

    let request = access_requests::create_or_merge_pending(
        pool.get_ref(),
        &payload.submission_id,
        entrepreneur_email,
        entrepreneur_name.unwrap_or(entrepreneur_email),
        question_ids,
    )
    .await?;

    Ok(HttpResponse::Created().json(AppSuccessResponse {
        success: true,
        message: "Access request submitted successfully".to_string(),
        data: Some(CreatedAccessRequest {
            request_id: request.id,
        }),
        pagination: None,
    }))
}

#[instrument(name = "List Access Requests", skip(pool))]
#[get("/requests/{submission_id}")]
pub async fn list_access_requests(
    pool: web::Data<SqlitePool>,
    identity: Identity,
    submission_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let owner_email = identity.require_factory()?;
    let submission_id = submission_id.into_inner();

    // A cross-tenant lookup comes back as a plain 404, same as a missing row.
    match submissions::fetch_submission(pool.get_ref(), &submission_id).await? {
        Some(submission) if submission.owner_email == owner_email => {}
        _ => return Err(AppError::not_found()),
    }

    let requests = access_requests::list_for_submission(pool.get_ref(), &submission_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        message: "Access requests retrieved successfully".to_string(),
        data: Some(requests),
        pagination: None,
    }))
}

#[instrument(name = "Respond To Access Request", skip(pool, payload))]
#[post("/requests/{request_id}/respond")]
pub async fn respond_to_access_request(
    pool: web::Data<SqlitePool>,
    identity: Identity,
    request_id: web::Path<String>,
    payload: web::Json<RespondToRequestPayload>,
) -> Result<impl Responder, AppError> {
    let responder_email = identity.require_factory()?;
    let request_id = request_id.into_inner();
    let decision = payload.into_inner().decision;

    let request = access_requests::fetch_request(pool.get_ref(), &request_id)
        .await?
        .ok_or_else(|| AppError {
            message: Some("Access request not found".to_string()),
            cause: None,
            error_type: crate::core::AppErrorType::NotFoundError,
        })?;

    let submission = submissions::fetch_submission(pool.get_ref(), &request.submission_id)
        .await?
        .ok_or_else(AppError::not_found)?;

    if submission.owner_email != responder_email {
        return Err(AppError::forbidden_error(
            "Only the owning factory can respond to this access request",
        ));
    }

    let resolved =
        access_requests::respond(pool.get_ref(), &request_id, decision.into_status()).await?;

    let message = match decision {
        RequestDecision::Approved => "Access request approved",
        RequestDecision::Denied => "Access request denied",
    };

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        message: message.to_string(),
        data: Some(resolved),
        pagination: None,
    }))
}
