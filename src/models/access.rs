use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use validator::Validate;

/// Stored question-id value meaning "every private question on the submission".
/// Grant rows keep the sentinel string; readers resolve it into `Access::Full`
/// at aggregation time so decision sites never compare against it directly.
pub const FULL_ACCESS_SENTINEL: &str = "all";

/// What a caller may see of a submission's private questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Full,
    Subset(BTreeSet<String>),
}

impl Access {
    pub fn none() -> Self {
        Access::Subset(BTreeSet::new())
    }

    pub fn allows(&self, question_id: &str) -> bool {
        match self {
            Access::Full => true,
            Access::Subset(question_ids) => question_ids.contains(question_id),
        }
    }

    /// Union of the question-id sets across all grant rows for one
    /// entrepreneur. The sentinel collapses the whole union into full access.
    pub fn from_grant_sets<I>(sets: I) -> Self
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let mut union = BTreeSet::new();
        for question_ids in sets {
            for question_id in question_ids {
                if question_id == FULL_ACCESS_SENTINEL {
                    return Access::Full;
                }
                union.insert(question_id);
            }
        }
        Access::Subset(union)
    }
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AccessGrantRow {
    pub id: String,
    pub submission_id: String,
    pub entrepreneur_email: String,
    pub question_ids: Json<Vec<String>>,
    pub granted_at: NaiveDateTime,
}

/// One row per entrepreneur in the owner's grant listing, unioned across
/// every grant record that has accumulated for the pair.
#[derive(Debug, Serialize)]
pub struct EntrepreneurGrant {
    pub entrepreneur_email: String,
    pub question_ids: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RevokeAccessPayload {
    #[validate(length(min = 1, message = "submission_id is required"))]
    pub submission_id: String,
    #[validate(email(message = "entrepreneur_email must be a valid email address"))]
    pub entrepreneur_email: String,
}

#[derive(Debug, Serialize)]
pub struct RevokeAccessResponse {
    pub revoked: bool,
}
