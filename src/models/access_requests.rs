use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Denied,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Denied => "denied",
        }
    }
}

/// The factory owner's decision on a pending request. `pending` is not a
/// decision, so this is a separate type rather than a reused `RequestStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestDecision {
    Approved,
    Denied,
}

impl RequestDecision {
    pub fn into_status(self) -> RequestStatus {
        match self {
            RequestDecision::Approved => RequestStatus::Approved,
            RequestDecision::Denied => RequestStatus::Denied,
        }
    }
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AccessRequest {
    pub id: String,
    pub submission_id: String,
    pub entrepreneur_email: String,
    pub entrepreneur_name: String,
    pub question_ids: Json<BTreeSet<String>>,
    pub status: RequestStatus,
    pub created_at: NaiveDateTime,
    pub responded_at: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccessRequestPayload {
    #[validate(length(min = 1, message = "submission_id is required"))]
    pub submission_id: String,
    #[validate(length(min = 1, message = "at least one question id is required"))]
    pub question_ids: Vec<String>,
}

impl CreateAccessRequestPayload {
    /// Requested ids carry set semantics: trimmed, deduplicated, empties dropped.
    pub fn normalized_question_ids(&self) -> BTreeSet<String> {
        self.question_ids
            .iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct RespondToRequestPayload {
    pub decision: RequestDecision,
}

#[derive(Debug, Serialize)]
pub struct CreatedAccessRequest {
    pub request_id: String,
}
