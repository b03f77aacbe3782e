use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{CommentAuthorKind, GradingStatus, QuestionType};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Worksheet {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct QuestionOption {
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) text: String,
    #[serde(default)]
    pub(crate) is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct WorksheetQuestion {
    pub(crate) id: String,
    pub(crate) worksheet_id: String,
    pub(crate) question_type: QuestionType,
    pub(crate) question: String,
    pub(crate) answer: String,
    pub(crate) points: f64,
    pub(crate) options: Json<Vec<QuestionOption>>,
    pub(crate) mark_scheme: Option<Json<serde_json::Value>>,
    pub(crate) order_index: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct StudentWorksheetResponse {
    pub(crate) id: String,
    pub(crate) worksheet_id: String,
    pub(crate) submission_id: String,
    pub(crate) student_id: String,
    pub(crate) is_submitted: bool,
    pub(crate) submitted_at: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct StudentQuestionProgress {
    pub(crate) id: String,
    pub(crate) response_id: String,
    pub(crate) question_id: String,
    pub(crate) student_id: String,
    pub(crate) student_answer: String,
    pub(crate) status: GradingStatus,
    pub(crate) is_correct: Option<bool>,
    pub(crate) points: Option<f64>,
    pub(crate) markscheme_state: Json<BTreeMap<String, bool>>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub(crate) enum CommentAuthor {
    User(String),
    Ai,
}

impl CommentAuthor {
    pub(crate) fn is_ai(&self) -> bool {
        matches!(self, Self::Ai)
    }

    pub(crate) fn kind(&self) -> CommentAuthorKind {
        match self {
            Self::User(_) => CommentAuthorKind::User,
            Self::Ai => CommentAuthorKind::Ai,
        }
    }

    pub(crate) fn user_id(&self) -> Option<&str> {
        match self {
            Self::User(id) => Some(id),
            Self::Ai => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Comment {
    pub(crate) id: String,
    pub(crate) progress_id: String,
    pub(crate) content: String,
    pub(crate) author: CommentAuthor,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct CommentRow {
    pub(crate) id: String,
    pub(crate) progress_id: String,
    pub(crate) content: String,
    pub(crate) author_kind: CommentAuthorKind,
    pub(crate) author_id: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        let author = match row.author_kind {
            CommentAuthorKind::Ai => CommentAuthor::Ai,
            CommentAuthorKind::User => CommentAuthor::User(row.author_id.unwrap_or_default()),
        };

        Self {
            id: row.id,
            progress_id: row.progress_id,
            content: row.content,
            author,
            created_at: row.created_at,
        }
    }
}

/// A progress row together with its comments, in creation order.
#[derive(Debug, Clone)]
pub(crate) struct ProgressSnapshot {
    pub(crate) progress: StudentQuestionProgress,
    pub(crate) comments: Vec<Comment>,
}
