use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::core::AppError;
use crate::models::pagination::PaginationQuery;
use crate::models::submissions::{Submission, SubmissionSummary};

const SUBMISSION_COLUMNS: &str =
    "id, owner_email, factory_name, answers, visibility, created_at, updated_at";

pub async fn insert_submission(
    pool: &SqlitePool,
    owner_email: &str,
    factory_name: &str,
    answers: &BTreeMap<String, String>,
    visibility: &BTreeMap<String, String>,
) -> Result<Submission, AppError> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().naive_utc();

    sqlx::query(
        r#"
        INSERT INTO submissions (id, owner_email, factory_name, answers, visibility, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(owner_email)
    .bind(factory_name)
    .bind(Json(answers))
    .bind(Json(visibility))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(AppError::db_error)?;

    fetch_submission(pool, &id)
        .await?
        .ok_or_else(|| AppError::internal_error("Inserted submission could not be read back"))
}

pub async fn fetch_submission(
    pool: &SqlitePool,
    submission_id: &str,
) -> Result<Option<Submission>, AppError> {
    sqlx::query_as::<_, Submission>(&format!(
        "SELECT {} FROM submissions WHERE id = ?",
        SUBMISSION_COLUMNS
    ))
    .bind(submission_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::db_error)
}

pub async fn list_submissions(
    pool: &SqlitePool,
    pagination: &PaginationQuery,
) -> Result<(Vec<SubmissionSummary>, i64), AppError> {
    let summaries = sqlx::query_as::<_, SubmissionSummary>(
        r#"
        SELECT id, factory_name, created_at, updated_at
        FROM submissions
        ORDER BY created_at DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(pool)
    .await
    .map_err(AppError::db_error)?;

    let total_items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM submissions")
        .fetch_one(pool)
        .await
        .map_err(AppError::db_error)?;

    Ok((summaries, total_items))
}

/// Shallow-merge update: incoming answer and visibility keys overlay the
/// stored maps, untouched keys persist. Runs in one transaction so a
/// concurrent save cannot interleave between the read and the write.
pub async fn update_submission(
    pool: &SqlitePool,
    submission_id: &str,
    factory_name: Option<&str>,
    answers: &BTreeMap<String, String>,
    visibility: &BTreeMap<String, String>,
) -> Result<Submission, AppError> {
    let mut transaction = pool.begin().await.map_err(AppError::db_error)?;

    let existing = sqlx::query_as::<_, Submission>(&format!(
        "SELECT {} FROM submissions WHERE id = ?",
        SUBMISSION_COLUMNS
    ))
    .bind(submission_id)
    .fetch_optional(transaction.as_mut())
    .await
    .map_err(AppError::db_error)?
    .ok_or_else(AppError::not_found)?;

    let mut merged_answers = existing.answers.0;
    merged_answers.extend(answers.iter().map(|(k, v)| (k.clone(), v.clone())));

    let mut merged_visibility = existing.visibility.0;
    merged_visibility.extend(visibility.iter().map(|(k, v)| (k.clone(), v.clone())));

    let factory_name = factory_name.unwrap_or(&existing.factory_name);
    let now = Utc::now().naive_utc();

    sqlx::query(
        r#"
        UPDATE submissions
        SET factory_name = ?, answers = ?, visibility = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(factory_name)
    .bind(Json(&merged_answers))
    .bind(Json(&merged_visibility))
    .bind(now)
    .bind(submission_id)
    .execute(transaction.as_mut())
    .await
    .map_err(AppError::db_error)?;

    transaction.commit().await.map_err(AppError::db_error)?;

    fetch_submission(pool, submission_id)
        .await?
        .ok_or_else(|| AppError::internal_error("Updated submission could not be read back"))
}

/// Deletes the row; grants and requests follow through the FK cascade.
pub async fn delete_submission(pool: &SqlitePool, submission_id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM submissions WHERE id = ?")
        .bind(submission_id)
        .execute(pool)
        .await
        .map_err(AppError::db_error)?;

    Ok(result.rows_affected() > 0)
}
