use std::collections::BTreeSet;

use chrono::Utc;
use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::core::{AppError, AppErrorType};
use crate::db::access;
use crate::models::access_requests::{AccessRequest, RequestStatus};

const REQUEST_COLUMNS: &str = "id, submission_id, entrepreneur_email, entrepreneur_name, \
     question_ids, status, created_at, responded_at";

/// Creates a pending request, or merges the asked question ids into the
/// entrepreneur's existing pending request for the same submission so a
/// repeat ask never produces a duplicate inbox row. Runs in one transaction.
pub async fn create_or_merge_pending(
    pool: &SqlitePool,
    submission_id: &str,
    entrepreneur_email: &str,
    entrepreneur_name: &str,
    question_ids: BTreeSet<String>,
) -> Result<AccessRequest, AppError> {
    let mut transaction = pool.begin().await.map_err(AppError::db_error)?;

    let existing = sqlx::query_as::<_, AccessRequest>(&format!(
        "SELECT {} FROM access_requests \
         WHERE submission_id = ? AND entrepreneur_email = ? AND status = 'pending'",
        REQUEST_COLUMNS
    ))
    .bind(submission_id)
    .bind(entrepreneur_email)
    .fetch_optional(transaction.as_mut())
    .await
    .map_err(AppError::db_error)?;

    let request = match existing {
        Some(mut request) => {
            request.question_ids.0.extend(question_ids);

            sqlx::query("UPDATE access_requests SET question_ids = ? WHERE id = ?")
                .bind(Json(&request.question_ids.0))
                .bind(&request.id)
                .execute(transaction.as_mut())
                .await
                .map_err(AppError::db_error)?;

            request
        }
        None => {
            let id = Uuid::new_v4().to_string();
            let created_at = Utc::now().naive_utc();

            sqlx::query(
                r#"
                INSERT INTO access_requests
                    (id, submission_id, entrepreneur_email, entrepreneur_name, question_ids, status, created_at, responded_at)
                VALUES (?, ?, ?, ?, ?, 'pending', ?, NULL)
                "#,
            )
            .bind(&id)
            .bind(submission_id)
            .bind(entrepreneur_email)
            .bind(entrepreneur_name)
            .bind(Json(&question_ids))
            .bind(created_at)
            .execute(transaction.as_mut())
            .await
            .map_err(AppError::db_error)?;

            AccessRequest {
                id,
                submission_id: submission_id.to_string(),
                entrepreneur_email: entrepreneur_email.to_string(),
                entrepreneur_name: entrepreneur_name.to_string(),
                question_ids: Json(question_ids),
                status: RequestStatus::Pending,
                created_at,
                responded_at: None,
            }
        }
    };

    transaction.commit().await.map_err(AppError::db_error)?;

    Ok(request)
}

pub async fn list_for_submission(
    pool: &SqlitePool,
    submission_id: &str,
) -> Result<Vec<AccessRequest>, AppError> {
    sqlx::query_as::<_, AccessRequest>(&format!(
        "SELECT {} FROM access_requests WHERE submission_id = ? ORDER BY created_at DESC",
        REQUEST_COLUMNS
    ))
    .bind(submission_id)
    .fetch_all(pool)
    .await
    .map_err(AppError::db_error)
}

pub async fn fetch_request(
    pool: &SqlitePool,
    request_id: &str,
) -> Result<Option<AccessRequest>, AppError> {
    sqlx::query_as::<_, AccessRequest>(&format!(
        "SELECT {} FROM access_requests WHERE id = ?",
        REQUEST_COLUMNS
    ))
    .bind(request_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)
}

/// Flips a pending request to its terminal status and, on approval, appends
/// the grant in the same transaction. The flip is a conditional UPDATE on
/// `status = 'pending'`, so a concurrent second response loses the race and
/// surfaces as a state conflict instead of overwriting the first decision.
pub async fn respond(
    pool: &SqlitePool,
    request_id: &str,
    status: RequestStatus,
) -> Result<AccessRequest, AppError> {
    let responded_at = Utc::now().naive_utc();
    let mut transaction = pool.begin().await.map_err(AppError::db_error)?;

    let mut request = sqlx::query_as::<_, AccessRequest>(&format!(
        "SELECT {} FROM access_requests WHERE id = ?",
        REQUEST_COLUMNS
    ))
    .bind(request_id)
    .fetch_optional(transaction.as_mut())
    .await
    .map_err(AppError::db_error)?
    .ok_or_else(|| AppError {
        message: Some("Access request not found".to_string()),
        cause: None,
        error_type: AppErrorType::NotFoundError,
    })?;

    let updated = sqlx::query(
        "UPDATE access_requests SET status = ?, responded_at = ? \
         WHERE id = ? AND status = 'pending'",
    )
    .bind(status)
    .bind(responded_at)
    .bind(request_id)
    .execute(transaction.as_mut())
    .await
    .map_err(AppError::db_error)?;

    if updated.rows_affected() == 0 {
        return Err(AppError::conflict_error(
            "This access request has already been resolved",
        ));
    }

    if status == RequestStatus::Approved {
        access::insert_grant(
            &mut transaction,
            &request.submission_id,
            &request.entrepreneur_email,
            &request.question_ids.0,
        )
        .await?;
    }

    transaction.commit().await.map_err(AppError::db_error)?;

    request.status = status;
    request.responded_at = Some(responded_at);
    Ok(request)
}
