use std::collections::BTreeMap;

use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::instrument;

use crate::{
    core::{
        config::FilesConfig,
        session_auth::{Identity, MaybeIdentity},
        validate_display_name, AppError, AppSuccessResponse,
    },
    db::{access, submissions},
    models::{
        access::Access,
        pagination::{PaginationMeta, PaginationQuery},
        submissions::{normalize_visibility, Submission},
    },
};

#[derive(Debug, Deserialize)]
pub struct CreateSubmissionPayload {
    pub factory_name: String,
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
    #[serde(default)]
    pub visibility: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSubmissionPayload {
    pub factory_name: Option<String>,
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
    #[serde(default)]
    pub visibility: BTreeMap<String, String>,
}

/// Owner lookup that does not reveal whether the submission exists: a missing
/// row and someone else's row both come back as a plain 404.
async fn fetch_owned_submission(
    pool: &SqlitePool,
    submission_id: &str,
    owner_email: &str,
) -> Result<Submission, AppError> {
    match submissions::fetch_submission(pool, submission_id).await? {
        Some(submission) if submission.owner_email == owner_email => Ok(submission),
        _ => Err(AppError::not_found()),
    }
}

#[instrument(name = "Create Submission", skip(pool, payload))]
#[post("")]
pub async fn create_submission(
    pool: web::Data<SqlitePool>,
    identity: Identity,
    payload: web::Json<CreateSubmissionPayload>,
) -> Result<impl Responder, AppError> {
    let owner_email = identity.require_factory()?;
    let payload = payload.into_inner();

    validate_display_name(&payload.factory_name)?;
    let visibility = normalize_visibility(&payload.visibility);

    let submission = submissions::insert_submission(
        pool.get_ref(),
        owner_email,
        &payload.factory_name,
        &payload.answers,
        &visibility,
    )
    .await?;

    Ok(HttpResponse::Created().json(AppSuccessResponse {
        success: true,
        message: "Submission created successfully".to_string(),
        data: Some(submission),
        pagination: None,
    }))
}

#[instrument(name = "Update Submission", skip(pool, payload))]
#[put("/{submission_id}")]
pub async fn update_submission(
    pool: web::Data<SqlitePool>,
    identity: Identity,
    submission_id: web::Path<String>,
    payload: web::Json<UpdateSubmissionPayload>,
) -> Result<impl Responder, AppError> {
    let owner_email = identity.require_factory()?;
    let submission_id = submission_id.into_inner();
    let payload = payload.into_inner();

    if let Some(factory_name) = &payload.factory_name {
        validate_display_name(factory_name)?;
    }

    fetch_owned_submission(pool.get_ref(), &submission_id, owner_email).await?;

    let visibility = normalize_visibility(&payload.visibility);
    let submission = submissions::update_submission(
        pool.get_ref(),
        &submission_id,
        payload.factory_name.as_deref(),
        &payload.answers,
        &visibility,
    )
    .await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        message: "Submission updated successfully".to_string(),
        data: Some(submission),
        pagination: None,
    }))
}

#[instrument(name = "Delete Submission", skip(pool, files))]
#[delete("/{submission_id}")]
pub async fn delete_submission(
    pool: web::Data<SqlitePool>,
    files: web::Data<FilesConfig>,
    identity: Identity,
    submission_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let owner_email = identity.require_factory()?;
    let submission_id = submission_id.into_inner();

    let submission = fetch_owned_submission(pool.get_ref(), &submission_id, owner_email).await?;

    submissions::delete_submission(pool.get_ref(), &submission_id).await?;

    // Uploaded answer files are removed best-effort; the row and its
    // grants/requests are already gone either way.
    let submission_dir = files.submission_dir(&submission_id);
    for file_ref in submission.file_refs() {
        let path = submission_dir.join(&file_ref.name);
        if let Err(e) = std::fs::remove_file(&path) {
            tracing::warn!("Failed to remove answer file {}: {}", path.display(), e);
        }
    }
    if let Err(e) = std::fs::remove_dir(&submission_dir) {
        tracing::warn!(
            "Failed to remove submission dir {}: {}",
            submission_dir.display(),
            e
        );
    }

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        message: "Submission deleted successfully".to_string(),
        data: Some(()),
        pagination: None,
    }))
}

#[instrument(name = "List Submissions", skip(pool))]
#[get("")]
pub async fn list_submissions(
    pool: web::Data<SqlitePool>,
    pagination: web::Query<PaginationQuery>,
) -> Result<impl Responder, AppError> {
    let mut pagination = pagination.into_inner();
    pagination.clamp();

    let (data, total_items) = submissions::list_submissions(pool.get_ref(), &pagination).await?;

    let pagination_meta = PaginationMeta::new(pagination.page, pagination.per_page, total_items);

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        message: "Submissions retrieved successfully".to_string(),
        data: Some(data),
        pagination: Some(pagination_meta),
    }))
}

#[instrument(name = "Get Visible Answers", skip(pool))]
#[get("/{submission_id}/answers")]
pub async fn get_visible_answers(
    pool: web::Data<SqlitePool>,
    identity: MaybeIdentity,
    submission_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let submission_id = submission_id.into_inner();

    let submission = submissions::fetch_submission(pool.get_ref(), &submission_id)
        .await?
        .ok_or_else(AppError::not_found)?;

    let access = match &identity.0 {
        Some(Identity::Factory { email }) if *email == submission.owner_email => Access::Full,
        Some(Identity::Entrepreneur { email, .. }) => {
            access::resolve_access(pool.get_ref(), &submission.id, email).await?
        }
        _ => Access::none(),
    };

    let visible = submission.visible_answers(&access);

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        message: "Answers retrieved successfully".to_string(),
        data: Some(visible),
        pagination: None,
    }))
}
