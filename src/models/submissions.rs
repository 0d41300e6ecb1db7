use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use crate::models::access::Access;

pub const VISIBILITY_PUBLIC: &str = "public";
pub const VISIBILITY_PRIVATE: &str = "private";

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Submission {
    pub id: String,
    pub owner_email: String,
    pub factory_name: String,
    /// questionId -> answer value. A value may be plain text ("yes"/"no"
    /// included), a single stored file path, or a JSON array of
    /// `{path, name}` objects for multi-file answers.
    pub answers: Json<BTreeMap<String, String>>,
    /// questionId -> "public" | "private". Absent key = public.
    pub visibility: Json<BTreeMap<String, String>>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Listing row for the public browse surface; answers stay out of it.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct SubmissionSummary {
    pub id: String,
    pub factory_name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// The answer set a caller is allowed to read, plus the ids of answers that
/// exist but stay hidden, so clients can render a "request access" placeholder
/// instead of treating the question as unanswered.
#[derive(Debug, Serialize)]
pub struct VisibleAnswers {
    pub answers: BTreeMap<String, String>,
    pub private_question_ids: Vec<String>,
}

impl Submission {
    pub fn is_private(&self, question_id: &str) -> bool {
        self.visibility
            .get(question_id)
            .map(|value| value == VISIBILITY_PRIVATE)
            .unwrap_or(false)
    }

    pub fn visible_answers(&self, access: &Access) -> VisibleAnswers {
        let mut answers = BTreeMap::new();
        let mut private_question_ids = Vec::new();

        for (question_id, value) in self.answers.iter() {
            if !self.is_private(question_id) || access.allows(question_id) {
                answers.insert(question_id.clone(), value.clone());
            } else {
                private_question_ids.push(question_id.clone());
            }
        }

        VisibleAnswers {
            answers,
            private_question_ids,
        }
    }

    /// Every stored file referenced by this submission's answers.
    pub fn file_refs(&self) -> Vec<FileRef> {
        self.answers
            .values()
            .flat_map(|value| parse_file_refs(value))
            .collect()
    }
}

/// Fail-open normalization: only the exact value "private" (after trimming,
/// case-insensitive) keeps a question private; anything else becomes public.
pub fn normalize_visibility(raw: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    raw.iter()
        .map(|(question_id, value)| {
            let normalized = if value.trim().eq_ignore_ascii_case(VISIBILITY_PRIVATE) {
                VISIBILITY_PRIVATE
            } else {
                VISIBILITY_PUBLIC
            };
            (question_id.clone(), normalized.to_string())
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub path: String,
    pub name: String,
}

/// Stored answer files are named `{questionId}__{unique suffix}`; the owning
/// question is recovered from the name, there is no separate stored field.
pub fn owning_question_id(file_name: &str) -> Option<&str> {
    let (question_id, rest) = file_name.split_once("__")?;
    if question_id.is_empty() || rest.is_empty() {
        return None;
    }
    Some(question_id)
}

/// Decodes an answer value into its file references, if it has any. A JSON
/// array of `{path, name}` objects is a multi-file answer; a bare value whose
/// final path component follows the file naming convention is a single file;
/// everything else is plain text.
pub fn parse_file_refs(value: &str) -> Vec<FileRef> {
    if let Ok(refs) = serde_json::from_str::<Vec<FileRef>>(value) {
        return refs;
    }

    let file_name = value.rsplit('/').next().unwrap_or(value);
    if owning_question_id(file_name).is_some() {
        return vec![FileRef {
            path: value.to_string(),
            name: file_name.to_string(),
        }];
    }

    Vec::new()
}
