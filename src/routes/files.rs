use std::fs;

use actix_web::{get, web, HttpResponse, Responder};
use sqlx::SqlitePool;
use tracing::instrument;

use crate::{
    core::{
        config::FilesConfig,
        session_auth::{Identity, MaybeIdentity},
        AppError,
    },
    db::{access, submissions},
    models::submissions::owning_question_id,
};

fn content_type_for(file_name: &str) -> &'static str {
    match file_name.rsplit('.').next() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("txt") => "text/plain",
        Some("csv") => "text/csv",
        _ => "application/octet-stream",
    }
}

/// Serves one stored answer file, authorized by the visibility of the
/// question the file belongs to. Unauthorized and nonexistent both come back
/// as the same 404 so the route leaks nothing about which submissions or
/// files exist.
#[instrument(name = "Serve Answer File", skip(pool, files))]
#[get("/{submission_id}/files/{file_name}")]
pub async fn serve_answer_file(
    pool: web::Data<SqlitePool>,
    files: web::Data<FilesConfig>,
    identity: MaybeIdentity,
    path: web::Path<(String, String)>,
) -> Result<impl Responder, AppError> {
    let (submission_id, file_name) = path.into_inner();

    if file_name.contains('/') || file_name.contains('\\') || file_name.contains("..") {
        return Err(AppError::validation_error("Invalid file name"));
    }

    // A file whose name does not resolve to an owning question has no
    // visibility entry to check, so it is never served.
    let question_id = owning_question_id(&file_name).ok_or_else(AppError::not_found)?;

    let submission = submissions::fetch_submission(pool.get_ref(), &submission_id)
        .await?
        .ok_or_else(AppError::not_found)?;

    let allowed = if !submission.is_private(question_id) {
        true
    } else {
        match &identity.0 {
            Some(Identity::Factory { email }) => *email == submission.owner_email,
            Some(Identity::Entrepreneur { email, .. }) => {
                access::resolve_access(pool.get_ref(), &submission.id, email)
                    .await?
                    .allows(question_id)
            }
            _ => false,
        }
    };

    if !allowed {
        return Err(AppError::not_found());
    }

    let file_path = files.submission_dir(&submission_id).join(&file_name);
    let file_bytes = fs::read(&file_path).map_err(|e| {
        tracing::warn!("Answer file {} could not be read: {}", file_path.display(), e);
        AppError::not_found()
    })?;

    Ok(HttpResponse::Ok()
        .content_type(content_type_for(&file_name))
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", file_name),
        ))
        .body(file_bytes))
}
