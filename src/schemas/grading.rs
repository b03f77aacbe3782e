use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{
    Comment, CommentAuthor, ProgressSnapshot, StudentQuestionProgress, StudentWorksheetResponse,
};
use crate::db::types::GradingStatus;
use crate::tasks::grading::DispatchSummary;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct OpenResponseRequest {
    #[validate(length(min = 1, max = 255, message = "submission_id must not be empty"))]
    pub(crate) submission_id: String,
    #[validate(length(min = 1, max = 255, message = "student_id must not be empty"))]
    pub(crate) student_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct RecordAnswerRequest {
    #[validate(length(max = 20000, message = "answer is too long"))]
    pub(crate) answer: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AddCommentRequest {
    #[validate(length(min = 1, max = 255, message = "author_id must not be empty"))]
    pub(crate) author_id: String,
    #[validate(length(min = 1, max = 5000, message = "content must be 1-5000 characters"))]
    pub(crate) content: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResponseDto {
    pub(crate) id: String,
    pub(crate) worksheet_id: String,
    pub(crate) submission_id: String,
    pub(crate) student_id: String,
    pub(crate) is_submitted: bool,
    pub(crate) submitted_at: Option<String>,
    pub(crate) created_at: String,
}

impl From<StudentWorksheetResponse> for ResponseDto {
    fn from(response: StudentWorksheetResponse) -> Self {
        Self {
            id: response.id,
            worksheet_id: response.worksheet_id,
            submission_id: response.submission_id,
            student_id: response.student_id,
            is_submitted: response.is_submitted,
            submitted_at: response.submitted_at.map(format_primitive),
            created_at: format_primitive(response.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CommentResponse {
    pub(crate) id: String,
    pub(crate) content: String,
    pub(crate) author: CommentAuthor,
    pub(crate) created_at: String,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            content: comment.content,
            author: comment.author,
            created_at: format_primitive(comment.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ProgressResponse {
    pub(crate) id: String,
    pub(crate) response_id: String,
    pub(crate) question_id: String,
    pub(crate) student_answer: String,
    pub(crate) status: GradingStatus,
    pub(crate) is_correct: Option<bool>,
    pub(crate) points: Option<f64>,
    pub(crate) markscheme_state: BTreeMap<String, bool>,
    pub(crate) comments: Vec<CommentResponse>,
    pub(crate) updated_at: String,
}

impl ProgressResponse {
    fn from_parts(progress: StudentQuestionProgress, comments: Vec<Comment>) -> Self {
        Self {
            id: progress.id,
            response_id: progress.response_id,
            question_id: progress.question_id,
            student_answer: progress.student_answer,
            status: progress.status,
            is_correct: progress.is_correct,
            points: progress.points,
            markscheme_state: progress.markscheme_state.0,
            comments: comments.into_iter().map(CommentResponse::from).collect(),
            updated_at: format_primitive(progress.updated_at),
        }
    }
}

impl From<ProgressSnapshot> for ProgressResponse {
    fn from(snapshot: ProgressSnapshot) -> Self {
        Self::from_parts(snapshot.progress, snapshot.comments)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct DispatchResponse {
    pub(crate) response_id: String,
    pub(crate) candidates: usize,
    pub(crate) spawned: usize,
}

impl DispatchResponse {
    pub(crate) fn new(response_id: String, summary: DispatchSummary) -> Self {
        Self { response_id, candidates: summary.candidates, spawned: summary.spawned }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GradingActionResponse {
    pub(crate) response_id: String,
    pub(crate) progress_id: String,
    pub(crate) status: GradingStatus,
}
