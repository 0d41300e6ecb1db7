use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use sqlx::types::Json;
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::core::AppError;
use crate::models::access::{Access, AccessGrantRow, EntrepreneurGrant};

/// Append-only insert, called exclusively from the request-approval
/// transition so a grant can never exist without an approved request.
pub async fn insert_grant(
    transaction: &mut Transaction<'_, Sqlite>,
    submission_id: &str,
    entrepreneur_email: &str,
    question_ids: &BTreeSet<String>,
) -> Result<(), AppError> {
    let id = Uuid::new_v4().to_string();
    let granted_at = Utc::now().naive_utc();

    sqlx::query(
        r#"
        INSERT INTO access_grants (id, submission_id, entrepreneur_email, question_ids, granted_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(submission_id)
    .bind(entrepreneur_email)
    .bind(Json(question_ids))
    .bind(granted_at)
    .execute(transaction.as_mut())
    .await
    .map_err(AppError::db_error)?;

    Ok(())
}

pub async fn fetch_grant_rows(
    pool: &SqlitePool,
    submission_id: &str,
) -> Result<Vec<AccessGrantRow>, AppError> {
    sqlx::query_as::<_, AccessGrantRow>(
        r#"
        SELECT id, submission_id, entrepreneur_email, question_ids, granted_at
        FROM access_grants
        WHERE submission_id = ?
        ORDER BY granted_at ASC
        "#,
    )
    .bind(submission_id)
    .fetch_all(pool)
    .await
    .map_err(AppError::db_error)
}

/// One row per entrepreneur, unioning question ids across every grant record
/// that has accumulated for the pair.
pub async fn aggregate_grants(
    pool: &SqlitePool,
    submission_id: &str,
) -> Result<Vec<EntrepreneurGrant>, AppError> {
    let rows = fetch_grant_rows(pool, submission_id).await?;

    let mut by_entrepreneur: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for row in rows {
        by_entrepreneur
            .entry(row.entrepreneur_email)
            .or_default()
            .extend(row.question_ids.0);
    }

    Ok(by_entrepreneur
        .into_iter()
        .map(|(entrepreneur_email, question_ids)| EntrepreneurGrant {
            entrepreneur_email,
            question_ids: question_ids.into_iter().collect(),
        })
        .collect())
}

/// Resolves one entrepreneur's current access to a submission from all of
/// their grant records.
pub async fn resolve_access(
    pool: &SqlitePool,
    submission_id: &str,
    entrepreneur_email: &str,
) -> Result<Access, AppError> {
    let rows = sqlx::query_as::<_, AccessGrantRow>(
        r#"
        SELECT id, submission_id, entrepreneur_email, question_ids, granted_at
        FROM access_grants
        WHERE submission_id = ? AND entrepreneur_email = ?
        "#,
    )
    .bind(submission_id)
    .bind(entrepreneur_email)
    .fetch_all(pool)
    .await
    .map_err(AppError::db_error)?;

    Ok(Access::from_grant_sets(
        rows.into_iter().map(|row| row.question_ids.0),
    ))
}

/// All-or-nothing revoke: removes every grant record for the pair. Returns
/// whether anything was actually deleted so callers can tell a no-op apart
/// from a real revocation without treating the no-op as an error.
pub async fn revoke_grants(
    pool: &SqlitePool,
    submission_id: &str,
    entrepreneur_email: &str,
) -> Result<bool, AppError> {
    let result =
        sqlx::query("DELETE FROM access_grants WHERE submission_id = ? AND entrepreneur_email = ?")
            .bind(submission_id)
            .bind(entrepreneur_email)
            .execute(pool)
            .await
            .map_err(AppError::db_error)?;

    Ok(result.rows_affected() > 0)
}
